use super::print_json;
use crate::cli::ReportArgs;
use crate::state::AppState;
use anyhow::{bail, Result};
use std::io::Write;

/// Print the public report addressed by a token.
pub async fn show(state: &AppState, args: &ReportArgs, out: &mut impl Write) -> Result<()> {
    match state.reader.get_by_token(&args.token).await? {
        Some(report) => print_json(out, &report),
        None => bail!("no public report for this token"),
    }
}
