use std::path::Path;

use bitematch_core::export::{
    render_matches_export, suggested_export_file_name, ExportFormat as MatchExportFormat,
};
use chrono::Utc;

use crate::cli::ExportFormat;
use crate::commands::common::{list_all_matches, CliContext};
use crate::error::CliError;

pub async fn run_export(
    ctx: &CliContext,
    format: ExportFormat,
    output_path: Option<&Path>,
) -> Result<(), CliError> {
    let matches = list_all_matches(&ctx.db).await?;
    let format = MatchExportFormat::from(format);
    let rendered = render_matches_export(&matches, format)?;

    if let Some(path) = output_path {
        let path = if path.is_dir() {
            path.join(suggested_export_file_name(format, Utc::now().timestamp_millis()))
        } else {
            path.to_path_buf()
        };
        std::fs::write(&path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}
