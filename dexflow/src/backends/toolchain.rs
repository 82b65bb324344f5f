//! Command lines of the standard Android build tools.

use super::{BackendSet, CommandBackend};
use crate::config::{BuildConfig, JavaCompiler};
use crate::project::Project;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Locations of the external tools.
///
/// Defaults are bare program names resolved through `PATH`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Toolchain {
    /// Kotlin compiler.
    pub kotlinc: PathBuf,
    /// JDK compiler.
    pub javac: PathBuf,
    /// Eclipse compiler.
    pub ecj: PathBuf,
    /// Dexer.
    pub d8: PathBuf,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            kotlinc: PathBuf::from("kotlinc"),
            javac: PathBuf::from("javac"),
            ecj: PathBuf::from("ecj"),
            d8: PathBuf::from("d8"),
        }
    }
}

impl Toolchain {
    /// Builds the adapters for every stage and compiler.
    #[must_use]
    pub fn backend_set(&self) -> BackendSet {
        BackendSet::new(Arc::new(self.kotlinc()), Arc::new(self.d8()))
            .with_java(JavaCompiler::Javac, Arc::new(self.javac()))
            .with_java(JavaCompiler::Ecj, Arc::new(self.ecj()))
    }

    /// `kotlinc -d <classes> -cp <classpath> <kt...> <java...>`.
    ///
    /// Java sources are passed along so Kotlin code can reference them.
    #[must_use]
    pub fn kotlinc(&self) -> CommandBackend {
        CommandBackend::new("kotlinc", &self.kotlinc, kotlinc_args)
    }

    /// `javac -d <classes> -cp <classpath> [--release N] <java...>`.
    #[must_use]
    pub fn javac(&self) -> CommandBackend {
        CommandBackend::new("javac", &self.javac, java_args)
    }

    /// `ecj -d <classes> -cp <classpath> [--release N] <java...>`.
    #[must_use]
    pub fn ecj(&self) -> CommandBackend {
        CommandBackend::new("ecj", &self.ecj, |project: &Project, config: &BuildConfig| {
            Ok(java_args(project, config)?.map(|mut args| {
                args.insert(0, OsString::from("-nowarn"));
                args
            }))
        })
    }

    /// `d8 --output <build> <class files...> <jars...>`.
    #[must_use]
    pub fn d8(&self) -> CommandBackend {
        CommandBackend::new("d8", &self.d8, d8_args)
    }
}

fn output_and_classpath(project: &Project) -> io::Result<Vec<OsString>> {
    Ok(vec![
        "-d".into(),
        project.classes_dir().into_os_string(),
        "-cp".into(),
        project.classpath()?.into(),
    ])
}

fn kotlinc_args(project: &Project, _config: &BuildConfig) -> io::Result<Option<Vec<OsString>>> {
    let kotlin = project.sources("kt")?;
    if kotlin.is_empty() {
        return Ok(None);
    }

    let mut args = output_and_classpath(project)?;
    args.extend(kotlin.into_iter().map(PathBuf::into_os_string));
    args.extend(project.sources("java")?.into_iter().map(PathBuf::into_os_string));
    Ok(Some(args))
}

fn java_args(project: &Project, config: &BuildConfig) -> io::Result<Option<Vec<OsString>>> {
    let java = project.sources("java")?;
    if java.is_empty() {
        return Ok(None);
    }

    let mut args = output_and_classpath(project)?;
    if let Some(release) = &config.java_release {
        args.push("--release".into());
        args.push(release.into());
    }
    args.extend(java.into_iter().map(PathBuf::into_os_string));
    Ok(Some(args))
}

fn d8_args(project: &Project, _config: &BuildConfig) -> io::Result<Option<Vec<OsString>>> {
    let classes = project.class_files()?;
    if classes.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no class files in {}", project.classes_dir().display()),
        ));
    }

    let mut args: Vec<OsString> = vec!["--output".into(), project.build_dir().into_os_string()];
    args.extend(classes.into_iter().map(PathBuf::into_os_string));
    args.extend(project.libraries()?.into_iter().map(PathBuf::into_os_string));
    Ok(Some(args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::BackendAdapter;
    use crate::core::BuildStage;

    fn project_with(files: &[(&str, &str)]) -> (tempfile::TempDir, Project) {
        let dir = tempfile::tempdir().unwrap();
        for (path, text) in files {
            let path = dir.path().join(path);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, text).unwrap();
        }
        let project = Project::new("demo", dir.path());
        (dir, project)
    }

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_java_args_with_release() {
        let (_dir, project) = project_with(&[("src/Main.java", "class Main {}")]);
        let config = BuildConfig {
            java_release: Some("8".to_string()),
            ..BuildConfig::default()
        };

        let args = strings(&java_args(&project, &config).unwrap().unwrap());
        assert_eq!(args[0], "-d");
        assert!(args[1].ends_with("build/classes"));
        assert_eq!(args[2], "-cp");
        assert_eq!(&args[4..6], ["--release", "8"]);
        assert!(args[6].ends_with("src/Main.java"));
    }

    #[test]
    fn test_kotlinc_skipped_without_kotlin_sources() {
        let (_dir, project) = project_with(&[("src/Main.java", "class Main {}")]);
        assert!(kotlinc_args(&project, &BuildConfig::default()).unwrap().is_none());
    }

    #[test]
    fn test_kotlinc_passes_java_sources() {
        let (_dir, project) = project_with(&[
            ("src/Main.java", "class Main {}"),
            ("src/Ext.kt", "fun ext() = 1"),
        ]);

        let args = strings(&kotlinc_args(&project, &BuildConfig::default()).unwrap().unwrap());
        assert!(args[4].ends_with("Ext.kt"));
        assert!(args[5].ends_with("Main.java"));
    }

    #[test]
    fn test_d8_requires_class_files() {
        let (_dir, project) = project_with(&[]);
        assert!(d8_args(&project, &BuildConfig::default()).is_err());

        let (_dir, project) = project_with(&[("build/classes/Main.class", "\u{0}")]);
        let args = strings(&d8_args(&project, &BuildConfig::default()).unwrap().unwrap());
        assert_eq!(args[0], "--output");
        assert!(args[2].ends_with("Main.class"));
    }

    #[test]
    fn test_backend_set_names() {
        let set = Toolchain::default().backend_set();
        let name = |stage, compiler| set.adapter_for(stage, compiler).unwrap().name().to_string();

        assert_eq!(name(BuildStage::CompileKotlin, JavaCompiler::Javac), "kotlinc");
        assert_eq!(name(BuildStage::CompileJava, JavaCompiler::Javac), "javac");
        assert_eq!(name(BuildStage::CompileJava, JavaCompiler::Ecj), "ecj");
        assert_eq!(name(BuildStage::Dex, JavaCompiler::Javac), "d8");
    }

    #[tokio::test]
    async fn test_ecj_with_no_sources_does_nothing() {
        let (_dir, project) = project_with(&[]);
        let ecj = Toolchain {
            ecj: PathBuf::from("dexflow-no-such-ecj"),
            ..Toolchain::default()
        }
        .ecj();

        ecj.run(&project, &BuildConfig::default()).await.unwrap();
    }
}
