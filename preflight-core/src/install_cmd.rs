use crate::{PreflightError, Result};
use std::path::Path;
use std::process::{Command, ExitStatus};

/// Host package manager that would perform the real install.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Yarn,
}

impl PackageManager {
    /// A `yarn.lock` in the project root means the project is yarn-managed.
    pub fn detect(project_root: &Path) -> PackageManager {
        if project_root.join("yarn.lock").is_file() {
            PackageManager::Yarn
        } else {
            PackageManager::Npm
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
        }
    }
}

/// How the delegated install records a newly added package.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SaveMode {
    #[default]
    None,
    Save,
    SaveDev,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl InstallCommand {
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    pub fn exec(&self, cwd: &Path) -> Result<ExitStatus> {
        Command::new(&self.program)
            .args(&self.args)
            .current_dir(cwd)
            .status()
            .map_err(|source| PreflightError::Spawn {
                program: self.program.clone(),
                source,
            })
    }
}

/// The command line the real install would use, for either the whole
/// project (`package` is None) or one added package.
pub fn install_command(
    manager: PackageManager,
    package: Option<&str>,
    save: SaveMode,
    production: bool,
) -> InstallCommand {
    let mut args: Vec<String> = Vec::new();

    match (manager, package) {
        (PackageManager::Npm, Some(spec)) => {
            args.push("install".to_string());
            args.push(spec.to_string());
            match save {
                SaveMode::Save => args.push("--save".to_string()),
                SaveMode::SaveDev => args.push("--save-dev".to_string()),
                SaveMode::None => {}
            }
        }
        (PackageManager::Npm, None) => {
            args.push("install".to_string());
            if production {
                args.push("--production".to_string());
            }
        }
        (PackageManager::Yarn, Some(spec)) => {
            args.push("add".to_string());
            args.push(spec.to_string());
            if save == SaveMode::SaveDev {
                args.push("--dev".to_string());
            }
        }
        (PackageManager::Yarn, None) => {
            args.push("install".to_string());
            if production {
                args.push("--production".to_string());
            }
        }
    }

    InstallCommand {
        program: manager.program().to_string(),
        args,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn detects_yarn_from_lockfile() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(PackageManager::detect(dir.path()), PackageManager::Npm);

        fs::write(dir.path().join("yarn.lock"), "").unwrap();
        assert_eq!(PackageManager::detect(dir.path()), PackageManager::Yarn);
    }

    #[test]
    fn npm_package_install_args() {
        let command = install_command(
            PackageManager::Npm,
            Some("express@^4"),
            SaveMode::Save,
            false,
        );
        assert_eq!(command.program, "npm");
        assert_eq!(command.args, vec!["install", "express@^4", "--save"]);
        assert_eq!(command.display(), "npm install express@^4 --save");
    }

    #[test]
    fn npm_project_install_honors_production() {
        let command = install_command(PackageManager::Npm, None, SaveMode::None, true);
        assert_eq!(command.args, vec!["install", "--production"]);
    }

    #[test]
    fn yarn_add_maps_save_dev_to_dev() {
        let command = install_command(
            PackageManager::Yarn,
            Some("left-pad"),
            SaveMode::SaveDev,
            false,
        );
        assert_eq!(command.program, "yarn");
        assert_eq!(command.args, vec!["add", "left-pad", "--dev"]);
    }

    #[test]
    fn yarn_project_install() {
        let command = install_command(PackageManager::Yarn, None, SaveMode::None, false);
        assert_eq!(command.args, vec!["install"]);
    }
}
