use panel_model::CheckResult;
use polars::prelude::DataFrame;

/// One result per configured must-exist column.
pub fn check_required_columns(long: &DataFrame, required: &[String]) -> Vec<CheckResult> {
    required
        .iter()
        .map(|column| {
            let present = long.column(column).is_ok();
            CheckResult::new(
                format!("required_column:{column}"),
                present,
                "present",
                if present { "present" } else { "absent" },
            )
        })
        .collect()
}
