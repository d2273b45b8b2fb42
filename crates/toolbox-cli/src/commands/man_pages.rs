use super::EXIT_SUCCESS;
use clap::CommandFactory;
use std::path::Path;
use toolbox_core::EXECUTABLE;

fn render(cmd: clap::Command, dir: &Path, name: &str) -> Result<(), String> {
    let mut buf = Vec::new();
    clap_mangen::Man::new(cmd)
        .render(&mut buf)
        .map_err(|e| format!("man page render failed: {e}"))?;
    let path = dir.join(format!("{name}.1"));
    std::fs::write(&path, &buf).map_err(|e| format!("failed to write {}: {e}", path.display()))
}

pub fn run<C: CommandFactory>(dir: &Path) -> Result<u8, String> {
    std::fs::create_dir_all(dir).map_err(|e| format!("failed to create dir: {e}"))?;
    let cmd = C::command();
    render(cmd.clone(), dir, EXECUTABLE)?;
    for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
        render(
            sub.clone(),
            dir,
            &format!("{EXECUTABLE}-{}", sub.get_name()),
        )?;
    }
    println!("man pages written to {}", dir.display());
    Ok(EXIT_SUCCESS)
}
