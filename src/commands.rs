//! Command execution.

use crate::Commands;
use colored::Colorize;
use statechart_core::{ActionId, ActionKind, Model, ModelError, RegionId, StateId};
use statechart_storage::{checksum_file, load, write_with, WriteOptions, WriteSummary};

/// Executes a command and returns the formatted output.
pub fn execute(cmd: Commands, options: &WriteOptions) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::New { file, name } => {
            if file.exists() {
                return Err(format!("{} already exists", file.display()).into());
            }
            let model = Model::new(name.as_str());
            let summary = write_with(&file, &model, options)?;
            Ok(format!(
                "{} model {} in {}\n  Root region: {}\n  {}",
                "Created".green(),
                name.cyan(),
                file.display(),
                model.root(),
                format_summary(&summary)
            ))
        }

        Commands::Info { file, json } => {
            let model = load(&file)?;
            let size = std::fs::metadata(&file)?.len();
            let checksum = checksum_file(&file)?;

            if json {
                let info = serde_json::json!({
                    "name": model.name(),
                    "version": model.version(),
                    "root": model.root().to_string(),
                    "regions": model.region_count(),
                    "states": model.state_count(),
                    "transitions": model.transition_count(),
                    "entries": model.entries().len(),
                    "exits": model.exits().len(),
                    "guards": model.guards().len(),
                    "actions": model.actions().len(),
                    "size_bytes": size,
                    "checksum": checksum,
                });
                return Ok(serde_json::to_string_pretty(&info)?);
            }

            Ok(format!(
                "{}\n  Version: {}\n  Root region: {}\n  Regions: {}\n  States: {}\n  Transitions: {}\n  Actions: {} entry, {} exit, {} guard, {} action\n  Size: {}\n  Checksum: {}",
                format!("Model {}", model.name().cyan()).bold(),
                model.version(),
                model.root(),
                model.region_count(),
                model.state_count(),
                model.transition_count(),
                model.entries().len(),
                model.exits().len(),
                model.guards().len(),
                model.actions().len(),
                format_bytes(size),
                checksum
            ))
        }

        Commands::Tree { file } => {
            let model = load(&file)?;
            let mut output = format!("{}\n", format!("Model {}", model.name().cyan()).bold());
            format_region(&model, model.root(), 1, &mut output)?;
            Ok(output.trim_end().to_string())
        }

        Commands::Check { file } => {
            let model = load(&file)?;
            let issues = model.integrity_issues();
            if issues.is_empty() {
                return Ok(format!(
                    "{} {} ({} regions, {} states, {} transitions, {} actions)",
                    "OK".green(),
                    file.display(),
                    model.region_count(),
                    model.state_count(),
                    model.transition_count(),
                    model.registry().len()
                ));
            }

            let mut output = format!("{} integrity issue(s) in {}", issues.len(), file.display());
            for issue in &issues {
                output.push_str(&format!("\n  - {}", issue));
            }
            Err(output.into())
        }

        Commands::AddAction { file, kind, name } => {
            let mut model = load(&file)?;
            let id = model.add_action(kind, name.as_str());
            let summary = write_with(&file, &model, options)?;
            Ok(format!(
                "{} {} action {} ({})\n  {}",
                "Added".green(),
                kind,
                name.cyan(),
                id,
                format_summary(&summary)
            ))
        }

        Commands::DeleteAction { file, id } => {
            let mut model = load(&file)?;
            let action = model.delete_action(id)?;
            let summary = write_with(&file, &model, options)?;
            Ok(format!(
                "{} {} action {} ({})\n  {}",
                "Deleted".green(),
                action.kind(),
                action.name().cyan(),
                id,
                format_summary(&summary)
            ))
        }

        Commands::AddState { file, name, region } => {
            let mut model = load(&file)?;
            let region = region.unwrap_or_else(|| model.root());
            let id = model.add_state(region, name.as_str())?;
            let summary = write_with(&file, &model, options)?;
            Ok(format!(
                "{} state {} ({})\n  Region: {}\n  {}",
                "Added".green(),
                name.cyan(),
                id,
                region,
                format_summary(&summary)
            ))
        }

        Commands::AddRegion {
            file,
            state,
            off_page,
        } => {
            let mut model = load(&file)?;
            let id = model.add_region(state, off_page)?;
            let summary = write_with(&file, &model, options)?;
            Ok(format!(
                "{} region {} to state {}\n  {}",
                "Added".green(),
                id.to_string().cyan(),
                state_label(&model, state),
                format_summary(&summary)
            ))
        }

        Commands::AddTransition {
            file,
            source,
            dest,
            trigger,
        } => {
            let mut model = load(&file)?;
            let id = model.add_transition(source, dest)?;
            if let Some(ref trigger) = trigger {
                model.transition_mut(id)?.set_trigger(trigger.as_str(), 0);
            }
            let summary = write_with(&file, &model, options)?;
            Ok(format!(
                "{} transition {} ({} → {})\n  {}",
                "Added".green(),
                id.to_string().cyan(),
                state_label(&model, source),
                state_label(&model, dest),
                format_summary(&summary)
            ))
        }

        Commands::AddEntry {
            file,
            state,
            action,
        } => {
            let mut model = load(&file)?;
            model.add_entry(state, action)?;
            let summary = write_with(&file, &model, options)?;
            Ok(format!(
                "{} entry action {} to state {}\n  {}",
                "Added".green(),
                action_label(&model, action, ActionKind::Entry),
                state_label(&model, state),
                format_summary(&summary)
            ))
        }

        Commands::AddExit {
            file,
            state,
            action,
        } => {
            let mut model = load(&file)?;
            model.add_exit(state, action)?;
            let summary = write_with(&file, &model, options)?;
            Ok(format!(
                "{} exit action {} to state {}\n  {}",
                "Added".green(),
                action_label(&model, action, ActionKind::Exit),
                state_label(&model, state),
                format_summary(&summary)
            ))
        }

        Commands::Fmt { file } => {
            let model = load(&file)?;
            let before = checksum_file(&file)?;
            let summary = write_with(&file, &model, options)?;
            let status = if before == summary.checksum {
                "Unchanged".yellow()
            } else {
                "Formatted".green()
            };
            Ok(format!("{} {}\n  {}", status, file.display(), format_summary(&summary)))
        }

        // InitConfig is handled directly in main.rs (it writes the config, not a document)
        Commands::InitConfig { .. } => unreachable!(),
    }
}

/// Appends the states and transitions of a region, indented by `depth`.
fn format_region(
    model: &Model,
    region: RegionId,
    depth: usize,
    output: &mut String,
) -> Result<(), ModelError> {
    let r = model.region(region)?;
    let indent = "  ".repeat(depth);
    let name = if r.name().is_empty() { "(unnamed)" } else { r.name() };
    output.push_str(&format!(
        "{}{} {} {}{}\n",
        indent,
        "region".dimmed(),
        name,
        r.id().to_string().dimmed(),
        if r.off_page() { " [off-page]" } else { "" }
    ));

    for &state in r.states() {
        let s = model.state(state)?;
        output.push_str(&format!(
            "{}  {} {} [{}] {}\n",
            indent,
            "state".dimmed(),
            s.name().cyan(),
            s.kind().as_str(),
            s.id().to_string().dimmed()
        ));
        for action in model.entry_actions(state)? {
            output.push_str(&format!("{}    entry: {}\n", indent, action.name()));
        }
        for action in model.exit_actions(state)? {
            output.push_str(&format!("{}    exit: {}\n", indent, action.name()));
        }
        for &child in s.regions() {
            format_region(model, child, depth + 2, output)?;
        }
    }

    for &transition in r.transitions() {
        let t = model.transition(transition)?;
        let mut line = format!(
            "{}  {} {} → {}",
            indent,
            "transition".dimmed(),
            state_label(model, t.source()),
            state_label(model, t.dest())
        );
        if !t.trigger_name().is_empty() {
            line.push_str(&format!(" on {}", t.trigger_name().yellow()));
        }
        let guards = model.guard_actions(transition)?;
        if !guards.is_empty() {
            let names: Vec<_> = guards.iter().map(|a| a.name()).collect();
            line.push_str(&format!(" [{}]", names.join(", ")));
        }
        let actions = model.transition_actions(transition)?;
        if !actions.is_empty() {
            let names: Vec<_> = actions.iter().map(|a| a.name()).collect();
            line.push_str(&format!(" / {}", names.join(", ")));
        }
        output.push_str(&line);
        output.push('\n');
    }

    Ok(())
}

fn state_label(model: &Model, id: StateId) -> String {
    match model.state(id) {
        Ok(s) if !s.name().is_empty() => s.name().to_string(),
        _ => id.to_string(),
    }
}

fn action_label(model: &Model, id: ActionId, kind: ActionKind) -> String {
    model
        .get_action(id, kind)
        .map(|a| a.name().to_string())
        .unwrap_or_else(|_| id.to_string())
}

fn format_summary(summary: &WriteSummary) -> String {
    format!(
        "Wrote {} (checksum: {})",
        format_bytes(summary.size_bytes),
        summary.checksum
    )
}

/// Formats bytes as human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn options() -> WriteOptions {
        WriteOptions::default().with_fsync(false)
    }

    fn new_document(dir: &TempDir) -> PathBuf {
        let file = dir.path().join("model.json");
        execute(
            Commands::New {
                file: file.clone(),
                name: "Door".to_string(),
            },
            &options(),
        )
        .unwrap();
        file
    }

    fn add_state(file: &Path, name: &str) -> StateId {
        execute(
            Commands::AddState {
                file: file.to_path_buf(),
                name: name.to_string(),
                region: None,
            },
            &options(),
        )
        .unwrap();
        load(file).unwrap().find_state_by_name(name).unwrap().id()
    }

    #[test]
    fn test_new_refuses_existing_file() {
        let dir = TempDir::new().unwrap();
        let file = new_document(&dir);

        let result = execute(
            Commands::New {
                file,
                name: "Other".to_string(),
            },
            &options(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_edit_commands_persist() {
        let dir = TempDir::new().unwrap();
        let file = new_document(&dir);
        let open = add_state(&file, "Open");
        let closed = add_state(&file, "Closed");

        execute(
            Commands::AddAction {
                file: file.clone(),
                kind: ActionKind::Entry,
                name: "lock".to_string(),
            },
            &options(),
        )
        .unwrap();
        let action = load(&file).unwrap().entries()[0].id();

        execute(
            Commands::AddEntry {
                file: file.clone(),
                state: closed,
                action,
            },
            &options(),
        )
        .unwrap();
        execute(
            Commands::AddTransition {
                file: file.clone(),
                source: open,
                dest: closed,
                trigger: Some("close".to_string()),
            },
            &options(),
        )
        .unwrap();

        let model = load(&file).unwrap();
        assert_eq!(model.name(), "Door");
        assert_eq!(model.state_count(), 2);
        assert_eq!(model.entry_actions(closed).unwrap()[0].name(), "lock");
        let transitions = model.transitions_from(open);
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].trigger_name(), "close");
        assert_eq!(transitions[0].dest(), closed);

        let tree = execute(Commands::Tree { file: file.clone() }, &options()).unwrap();
        assert!(tree.contains("Open"));
        assert!(tree.contains("entry: lock"));
        assert!(tree.contains("close"));

        let check = execute(Commands::Check { file }, &options()).unwrap();
        assert!(check.contains("OK"));
    }

    #[test]
    fn test_delete_action_command() {
        let dir = TempDir::new().unwrap();
        let file = new_document(&dir);
        let state = add_state(&file, "Idle");

        execute(
            Commands::AddAction {
                file: file.clone(),
                kind: ActionKind::Exit,
                name: "stop".to_string(),
            },
            &options(),
        )
        .unwrap();
        let action = load(&file).unwrap().exits()[0].id();
        execute(
            Commands::AddExit {
                file: file.clone(),
                state,
                action,
            },
            &options(),
        )
        .unwrap();

        execute(
            Commands::DeleteAction {
                file: file.clone(),
                id: action,
            },
            &options(),
        )
        .unwrap();

        let model = load(&file).unwrap();
        assert!(model.exits().is_empty());
        assert!(model.state(state).unwrap().exits().is_empty());
        assert_eq!(model.state(state).unwrap().region_y_offset(), 0.0);

        let again = execute(Commands::DeleteAction { file, id: action }, &options());
        assert!(again.is_err());
    }

    #[test]
    fn test_add_region_and_nested_state() {
        let dir = TempDir::new().unwrap();
        let file = new_document(&dir);
        let parent = add_state(&file, "Running");

        execute(
            Commands::AddRegion {
                file: file.clone(),
                state: parent,
                off_page: true,
            },
            &options(),
        )
        .unwrap();
        let region = load(&file).unwrap().state(parent).unwrap().regions()[0];

        execute(
            Commands::AddState {
                file: file.clone(),
                name: "Fast".to_string(),
                region: Some(region),
            },
            &options(),
        )
        .unwrap();

        let model = load(&file).unwrap();
        let fast = model.find_state_by_name("Fast").unwrap();
        assert_eq!(fast.owning_region(), region);
        assert!(model.region(region).unwrap().off_page());
        assert!(model.state(parent).unwrap().is_composite());
    }

    #[test]
    fn test_info_json() {
        let dir = TempDir::new().unwrap();
        let file = new_document(&dir);
        add_state(&file, "A");

        let output = execute(Commands::Info { file, json: true }, &options()).unwrap();
        let info: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(info["name"], "Door");
        assert_eq!(info["states"], 1);
        assert_eq!(info["regions"], 1);
        assert_eq!(info["checksum"].as_str().unwrap().len(), 8);
    }

    #[test]
    fn test_fmt_is_stable() {
        let dir = TempDir::new().unwrap();
        let file = new_document(&dir);
        add_state(&file, "A");
        let before = std::fs::read(&file).unwrap();

        let output = execute(Commands::Fmt { file: file.clone() }, &options()).unwrap();
        assert!(output.contains("Unchanged"));
        assert_eq!(std::fs::read(&file).unwrap(), before);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
    }
}
