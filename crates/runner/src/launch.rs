//! Launch planning and process start-up.
//!
//! [`plan_launch`] turns a classification into concrete commands without
//! side effects; [`launch`] runs them inside the repository with the
//! database credentials exported.

use std::fmt;
use std::path::Path;
use std::process::Stdio;

use launchpad_core::{AppKind, DbConfig, EntryPoint};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::error::RunnerError;
use crate::registry::ProcessRegistry;

/// Package-script runner used when a manifest is present.
const PACKAGE_RUNNER: &str = "npm";

/// Script engine for Node.js entry points.
const NODE_BIN: &str = "node";

/// Interpreter for Python entry points.
const PYTHON_BIN: &str = "python";

/// Bind address passed to Django's development server.
const DJANGO_BIND: &str = "0.0.0.0:8000";

/// A single program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    fn new<I, S>(label: &str, program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.to_string(),
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Build the command, rooted in `repo` with `env` exported.
    fn command(&self, repo: &Path, env: &[(String, String)]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(repo)
            .envs(env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Optional build step followed by the long-running start command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub build: Option<CommandSpec>,
    pub start: CommandSpec,
}

/// Decide how to start the application.
///
/// A package manifest always means `npm run build` then `npm run start`,
/// whatever the classified family.
pub fn plan_launch(kind: AppKind, entry: &EntryPoint, has_manifest: bool) -> LaunchPlan {
    if has_manifest {
        return LaunchPlan {
            build: Some(CommandSpec::new("build", PACKAGE_RUNNER, ["run", "build"])),
            start: CommandSpec::new("start", PACKAGE_RUNNER, ["run", "start"]),
        };
    }

    let entry_arg = entry.path.to_string_lossy().into_owned();
    let start = match kind {
        AppKind::Node => CommandSpec::new("node", NODE_BIN, [entry_arg]),
        AppKind::Python if entry.is_django_manage() => CommandSpec::new(
            "django",
            PYTHON_BIN,
            [entry_arg, "runserver".to_string(), DJANGO_BIND.to_string()],
        ),
        AppKind::Python => CommandSpec::new("python", PYTHON_BIN, [entry_arg]),
    };

    LaunchPlan { build: None, start }
}

/// Run the build step, then spawn and track the start command.
///
/// Build failures are reported and otherwise ignored. Failing to spawn the
/// start command is an error. If `cancel` fires while the build is running,
/// the build is killed and the start command is never spawned.
pub async fn launch(
    plan: &LaunchPlan,
    repo: &Path,
    db: &DbConfig,
    registry: &mut ProcessRegistry,
    cancel: &CancellationToken,
) -> Result<(), RunnerError> {
    let env = db.env_vars();

    if let Some(build) = &plan.build {
        if !run_build(build, repo, &env, cancel).await {
            tracing::info!("Build interrupted, not starting the application");
            return Ok(());
        }
    }

    if cancel.is_cancelled() {
        tracing::info!("Shutdown requested, not starting the application");
        return Ok(());
    }

    tracing::info!(command = %plan.start, "Starting the application");
    let child = plan
        .start
        .command(repo, &env)
        .spawn()
        .map_err(|source| RunnerError::Spawn {
            command: plan.start.to_string(),
            source,
        })?;

    tracing::info!(pid = ?child.id(), label = %plan.start.label, "Application started");
    registry.track(plan.start.label.clone(), child);
    Ok(())
}

/// Run the build to completion. Returns `false` if `cancel` fired first, in
/// which case the build process has been killed.
async fn run_build(
    build: &CommandSpec,
    repo: &Path,
    env: &[(String, String)],
    cancel: &CancellationToken,
) -> bool {
    tracing::info!(command = %build, "Building the application");
    let mut child = match build.command(repo, env).spawn() {
        Ok(child) => child,
        Err(e) => {
            tracing::warn!(error = %e, "Build could not be run, attempting to start anyway");
            return true;
        }
    };

    tokio::select! {
        _ = cancel.cancelled() => {
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "Failed to kill build process");
            }
            false
        }
        status = child.wait() => {
            match status {
                Ok(status) if status.success() => tracing::info!("Build finished"),
                Ok(status) => {
                    tracing::warn!(%status, "Build may have failed, attempting to start anyway");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Build wait failed, starting anyway");
                }
            }
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use launchpad_core::EntrySource;

    use super::*;

    fn entry(path: &str) -> EntryPoint {
        EntryPoint {
            path: PathBuf::from(path),
            source: EntrySource::Candidate,
        }
    }

    #[test]
    fn manifest_uses_package_scripts() {
        let plan = plan_launch(AppKind::Node, &entry("server.js"), true);
        assert_eq!(
            plan.build.as_ref().map(ToString::to_string).as_deref(),
            Some("npm run build")
        );
        assert_eq!(plan.start.to_string(), "npm run start");
    }

    #[test]
    fn node_entry_runs_with_node() {
        let plan = plan_launch(AppKind::Node, &entry("index.js"), false);
        assert_eq!(plan.build, None);
        assert_eq!(plan.start.to_string(), "node index.js");
    }

    #[test]
    fn django_manage_gets_server_arguments() {
        let plan = plan_launch(AppKind::Python, &entry("manage.py"), false);
        assert_eq!(
            plan.start.to_string(),
            "python manage.py runserver 0.0.0.0:8000"
        );
    }

    #[test]
    fn nested_manage_script_is_still_django() {
        let plan = plan_launch(AppKind::Python, &entry("backend/manage.py"), false);
        assert_eq!(plan.start.label, "django");
        assert_eq!(
            plan.start.to_string(),
            "python backend/manage.py runserver 0.0.0.0:8000"
        );
    }

    #[test]
    fn python_entry_runs_with_interpreter() {
        let plan = plan_launch(AppKind::Python, &entry("app.py"), false);
        assert_eq!(plan.start.label, "python");
        assert_eq!(plan.start.args, vec!["app.py".to_string()]);
    }
}
