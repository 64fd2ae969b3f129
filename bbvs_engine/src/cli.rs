use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    about = "Headless host that steps Bbvs scenes tick by tick",
    version
)]
pub struct Args {
    /// Directory holding scene modules named scene_<NN>.json
    #[arg(long, default_value = "data/scenes")]
    pub data_root: PathBuf,

    /// Scene number to start in
    #[arg(long, default_value_t = 1)]
    pub scene: i32,

    /// Number of logical ticks to simulate
    #[arg(long, default_value_t = 600)]
    pub ticks: u32,

    /// JSON list of timed mouse/key events to replay
    #[arg(long)]
    pub input_script: Option<PathBuf>,

    /// Path to write the per-tick trace (scene, state, actor positions) as JSON
    #[arg(long)]
    pub trace_json: Option<PathBuf>,

    /// Path to write the audio event log as JSON
    #[arg(long)]
    pub audio_log_json: Option<PathBuf>,

    /// Path to write the engine event trace as JSON
    #[arg(long)]
    pub event_log_json: Option<PathBuf>,

    /// Write a manual save of the last save-allowed snapshot after the run
    #[arg(long)]
    pub save_out: Option<PathBuf>,

    /// Restore a save file after entering the start scene
    #[arg(long)]
    pub load: Option<PathBuf>,

    /// Simulated wall-clock milliseconds per host frame
    #[arg(long, default_value_t = 17)]
    pub frame_ms: u32,

    /// Print the scene numbers found under --data-root and exit
    #[arg(long)]
    pub list_scenes: bool,
}

#[derive(Debug)]
pub enum Command {
    Run(RunArgs),
    ListScenes { data_root: PathBuf },
}

#[derive(Debug)]
pub struct RunArgs {
    pub data_root: PathBuf,
    pub scene: i32,
    pub ticks: u32,
    pub input_script: Option<PathBuf>,
    pub trace_json: Option<PathBuf>,
    pub audio_log_json: Option<PathBuf>,
    pub event_log_json: Option<PathBuf>,
    pub save_out: Option<PathBuf>,
    pub load: Option<PathBuf>,
    pub frame_ms: u32,
}

pub fn parse() -> Result<Command> {
    let args = Args::parse();
    args.into_command()
}

impl Args {
    fn into_command(self) -> Result<Command> {
        if self.list_scenes {
            if self.load.is_some() || self.save_out.is_some() {
                bail!("--list-scenes cannot be combined with --load or --save-out");
            }
            return Ok(Command::ListScenes {
                data_root: self.data_root,
            });
        }
        if self.frame_ms == 0 {
            bail!("--frame-ms must be at least 1");
        }

        Ok(Command::Run(RunArgs {
            data_root: self.data_root,
            scene: self.scene,
            ticks: self.ticks,
            input_script: self.input_script,
            trace_json: self.trace_json,
            audio_log_json: self.audio_log_json,
            event_log_json: self.event_log_json,
            save_out: self.save_out,
            load: self.load,
            frame_ms: self.frame_ms,
        }))
    }
}
