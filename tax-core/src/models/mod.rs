mod filing_status;
mod income;
mod jurisdiction;
mod tax_bracket;
mod tax_regime;
mod tax_year_config;

pub use filing_status::FilingStatus;
pub use income::{IncomeProfile, SafeHarborInputs, SafeHarborMethod, SelfEmploymentInputs};
pub use jurisdiction::{
    FederalBrackets, JurisdictionTable, StateCode, StateCredit, StatePolicy, UnknownStateCode,
};
pub use tax_bracket::{BracketTable, BracketTableError, TaxBracket};
pub use tax_regime::{FlatRatePolicy, TaxRegime};
pub use tax_year_config::{
    FreelanceConfig, PayrollTaxConfig, QuarterlyDeadline, SafeHarborConfig, SelfEmploymentConfig, TaxYearConfig,
    TaxYearConfigError,
};
