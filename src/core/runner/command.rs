use std::path::Path;

use crate::core::settings::GlobalSettings;
use crate::core::transfer;

/// An immutable argument vector for one child process. Built once, never
/// mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableCommand {
    args: Vec<String>,
}

impl ExecutableCommand {
    pub fn new(args: Vec<String>) -> Self {
        Self { args }
    }

    pub fn program(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or_default()
    }

    pub fn arguments(&self) -> &[String] {
        &self.args[self.args.len().min(1)..]
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Human-readable rendering for diagnostics and spawn-failure messages.
    pub fn readable(&self) -> String {
        self.args
            .iter()
            .map(|arg| shell_escape(arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Display for ExecutableCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.readable())
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }
    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=' | '+')
    }) {
        return raw.to_string();
    }
    format!("\"{}\"", raw.replace('"', "\\\""))
}

/// Builds the argument vectors the bootstrap spawns.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandFactory;

impl CommandFactory {
    /// The full launch command:
    /// `[java, properties…, -Xms?, -Xmx?, vm args…, -cp, <sep><classpath>,
    /// main class, app args…]` with every blank token removed.
    pub fn run_application_command(
        &self,
        settings: &GlobalSettings,
        runtime_dir: &Path,
    ) -> ExecutableCommand {
        let mut args: Vec<String> = Vec::new();
        args.push(
            transfer::runtime_command_path(runtime_dir)
                .to_string_lossy()
                .to_string(),
        );
        args.extend(settings.properties().iter().cloned());
        args.push(settings.initial_heap_flag());
        args.push(settings.max_heap_flag());
        args.extend(settings.vm_args_list());
        args.push("-cp".to_string());
        // The classpath does not resolve without a leading separator.
        args.push(format!(
            "{}{}",
            settings.path_separator(),
            settings.classpath_text()
        ));
        args.push(settings.main_class().to_string());
        args.extend(settings.application_arguments().iter().cloned());

        args.retain(|arg| !arg.trim().is_empty());
        ExecutableCommand::new(args)
    }

    /// Probe used to validate a cached unzip directory: the runtime must
    /// actually execute, not merely have a recorded path.
    pub fn version_probe_command(&self, runtime_dir: &Path) -> ExecutableCommand {
        ExecutableCommand::new(vec![
            transfer::runtime_command_path(runtime_dir)
                .to_string_lossy()
                .to_string(),
            "-version".to_string(),
        ])
    }
}
