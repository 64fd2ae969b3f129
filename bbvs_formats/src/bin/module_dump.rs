use std::path::PathBuf;

use anyhow::{Context, Result};
use bbvs_formats::{CommandKind, GameModule};
use clap::Parser;

/// Prints table sizes for a scene module and checks its cross references.
#[derive(Parser, Debug)]
#[command(about = "Summarise a Bbvs scene module JSON file", version)]
struct Args {
    /// Scene module JSON file
    module: PathBuf,

    /// List every action with its command timeline
    #[arg(long)]
    actions: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let module = GameModule::load(&args.module)
        .with_context(|| format!("inspecting {}", args.module.display()))?;

    println!("{}", args.module.display());
    println!(
        "  search budget (fieldC): {}  primary actor: {}",
        module.field_c,
        module
            .primary_actor_index
            .map(|index| format!("#{index} {}", module.scene_object_def(index).name))
            .unwrap_or_else(|| String::from("none"))
    );
    let counts = [
        ("walk rects", module.walk_rects.len()),
        ("scene object defs", module.scene_object_defs.len()),
        ("scene object inits", module.scene_object_inits.len()),
        ("actions", module.actions.len()),
        ("animations", module.animations.len()),
        ("cameras", module.camera_inits.len()),
        ("scene exits", module.scene_exits.len()),
        ("scene sounds", module.scene_sounds.len()),
        ("background objects", module.bg_objects.len()),
        ("preloaded sounds", module.preload_sounds.len()),
    ];
    for (label, count) in counts {
        println!("  {label:<20} {count:>5}");
    }

    if args.actions {
        for (index, action) in module.actions.iter().enumerate() {
            let stops = action
                .commands
                .iter()
                .filter(|command| command.cmd == CommandKind::Stop)
                .count();
            let last = action
                .commands
                .last()
                .map(|command| command.time_stamp)
                .unwrap_or(0);
            println!(
                "  action {index:>4}: {conds} conditions, {cmds:>3} commands over {last:>4} ticks, {results} results{warn}",
                conds = action.conditions.len(),
                cmds = action.commands.len(),
                results = action.results.len(),
                warn = if stops == 0 { " (no stop)" } else { "" },
            );
        }
    }
    Ok(())
}
