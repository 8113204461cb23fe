use anyhow::Result;

fn main() -> Result<()> {
    webcap::cli::run()
}
