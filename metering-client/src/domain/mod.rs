pub mod baseline;
pub mod classification;
pub mod definition;
pub mod indicator;
pub mod reading;

pub use baseline::{Baseline, NewBaseline};
pub use classification::{Classification, ClassificationType, NewClassification};
pub use definition::{
    EnpiDefinition, NewEnpiDefinition, NewTarget, ParseTargetKindError, Target, TargetKind,
    NO_NORMALIZATION,
};
pub use indicator::{
    BaselineStatus, Indicator, IndicatorFormula, NewIndicator, ParseBaselineStatusError,
    ParseFormulaError,
};
pub use reading::{Measurement, NewReading, Reading, ReadingFilter};
