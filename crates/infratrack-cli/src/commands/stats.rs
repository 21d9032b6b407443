//! Stats command implementation

use super::{display_paths, load_network};
use crate::cli::StatsArgs;
use crate::output::OutputWriter;
use crate::output_types::StatsOutput;
use anyhow::Result;
use infratrack_core::config::LayeredConfig;
use infratrack_core::NetworkStats;

pub async fn execute(args: StatsArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let network = load_network(&args.input, config, output).await?;
    let stats = NetworkStats::compute(&network);

    if output.is_json() {
        let mut files = display_paths(&args.input.files);
        files.extend(display_paths(&args.input.points_files));
        return output.result(StatsOutput { files, stats });
    }

    output.section("Segments");
    output.kv("Count", stats.segment_count);
    output.kv("Total length", format!("{:.1} m", stats.total_length_m));
    output.kv("Executed length", format!("{:.1} m", stats.completed_length_m));
    output.kv("Progress", format!("{}%", stats.progress_percent));

    output.section("Points");
    output.kv("Count", stats.point_count);
    output.kv("Completed", stats.points_completed);
    output.kv("In progress", stats.points_in_progress);
    output.kv("Pending", stats.points_pending);

    Ok(())
}
