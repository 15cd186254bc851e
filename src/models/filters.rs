use chrono::NaiveDate;

/// Date window passed to category sources. Empty bounds mean
/// "everything"; sources apply both bounds inclusively.
#[derive(Debug, Clone, Default)]
pub struct SourceFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}
