use crate::error::{Result, TagscopeError};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One external command to run: argv vector, working directory and an
/// explicit environment. The child never sees the parent environment
/// wholesale; it gets `env` plus a minimal baseline (PATH for binary
/// lookup, HOME because the tool reads `~/.globalrc`).
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
    pub must_succeed: bool,
}

impl Invocation {
    fn render(&self) -> String {
        let mut rendered = self.program.clone();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }
}

#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub code: Option<i32>,
}

/// Spawns the invocation, waits for it to exit and captures both output
/// streams. Expiry of `timeout` kills the child and fails with
/// `ExternalTool`, as does a non-zero exit when `must_succeed` is set.
pub async fn run(invocation: &Invocation, timeout: Duration) -> Result<CommandOutput> {
    let rendered = invocation.render();
    tracing::debug!(command = %rendered, cwd = %invocation.cwd.display(), "spawning external tool");

    let mut command = Command::new(&invocation.program);
    command
        .args(&invocation.args)
        .current_dir(&invocation.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .env_clear()
        .kill_on_drop(true);
    if let Ok(path) = std::env::var("PATH") {
        command.env("PATH", path);
    }
    for (key, value) in &invocation.env {
        command.env(key, value);
    }
    if !invocation.env.iter().any(|(key, _)| key == "HOME") {
        if let Ok(home) = std::env::var("HOME") {
            command.env("HOME", home);
        }
    }

    let child = command.spawn().map_err(|e| TagscopeError::ExternalTool {
        command: rendered.clone(),
        stderr: e.to_string(),
    })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(TagscopeError::ExternalTool {
                command: rendered,
                stderr: format!("deadline exceeded after {timeout:?}"),
            })
        }
    };

    if !output.stderr.is_empty() {
        tracing::debug!(command = %rendered, stderr = %String::from_utf8_lossy(&output.stderr), "tool stderr");
    }

    if invocation.must_succeed && !output.status.success() {
        return Err(TagscopeError::ExternalTool {
            command: rendered,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(CommandOutput {
        stdout: output.stdout,
        stderr: output.stderr,
        code: output.status.code(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str, must_succeed: bool) -> Invocation {
        Invocation {
            program: "/bin/sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            cwd: std::env::temp_dir(),
            env: Vec::new(),
            must_succeed,
        }
    }

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let out = run(&sh("printf hello", true), DEFAULT_TIMEOUT).await.unwrap();
        assert_eq!(out.stdout, b"hello");
        assert_eq!(out.code, Some(0));
    }

    #[tokio::test]
    async fn nonzero_exit_fails_when_required() {
        let err = run(&sh("exit 3", true), DEFAULT_TIMEOUT).await.unwrap_err();
        assert!(matches!(err, TagscopeError::ExternalTool { .. }));
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported_when_tolerated() {
        let out = run(&sh("echo oops >&2; exit 3", false), DEFAULT_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stderr, b"oops\n");
    }

    #[tokio::test]
    async fn home_is_always_present_in_the_child_environment() {
        let out = run(&sh("printf '%s' \"$HOME\"", true), DEFAULT_TIMEOUT)
            .await
            .unwrap();
        assert!(!out.stdout.is_empty());
    }

    #[tokio::test]
    async fn timeout_expiry_is_an_external_tool_error() {
        let err = run(&sh("sleep 5", true), Duration::from_millis(100))
            .await
            .unwrap_err();
        match err {
            TagscopeError::ExternalTool { stderr, .. } => {
                assert!(stderr.contains("deadline exceeded"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
