use anyhow::Result;
use sparkify_dwh::{cli, JobKind};

fn main() -> Result<()> {
    cli::run(JobKind::Load)
}
