/// Selection metadata for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionInfo {
    pub reference_solution: String,
    /// Selection connection both queries run against.
    pub default_schema: String,
    pub check_order: bool,
    pub check_column_names: bool,
    pub schemas: Vec<String>,
}

/// Stored flags are `"Y"`/`"N"`; anything but `"Y"` is off.
pub fn parse_flag(raw: &str) -> bool {
    raw == "Y"
}
