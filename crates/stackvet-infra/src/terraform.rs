//! Terraform CLI provisioning adapter.
//!
//! Runs `terraform init/apply/destroy/output` in the template directory with
//! captured output, a per-command timeout, and a bounded retry budget for
//! apply and destroy. Outputs are retrieved with `output -json` and parsed
//! into [`StackOutputs`].

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use stackvet_core::StackOutputs;

use crate::error::{InfraError, InfraResult};
use crate::traits::{Provisioner, StackConfig};

/// Terraform-backed [`Provisioner`].
pub struct TerraformCli {
    binary: String,
}

impl TerraformCli {
    pub fn new() -> Self {
        Self {
            binary: "terraform".to_string(),
        }
    }

    /// Use a different binary, e.g. `tofu`.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn init_args(config: &StackConfig) -> Vec<String> {
        let mut args = vec![
            "init".to_string(),
            "-no-color".to_string(),
            "-input=false".to_string(),
            "-reconfigure".to_string(),
        ];
        if let Some(ref backend) = config.backend {
            args.push(format!("-backend-config=bucket={}", backend.bucket));
            args.push(format!("-backend-config=key={}", backend.key));
            args.push(format!("-backend-config=region={}", backend.region));
        }
        args
    }

    fn apply_args(config: &StackConfig) -> Vec<String> {
        let mut args = vec![
            "apply".to_string(),
            "-auto-approve".to_string(),
            "-no-color".to_string(),
            "-input=false".to_string(),
        ];
        for var_file in &config.var_files {
            args.push(format!("-var-file={}", var_file.display()));
        }
        args
    }

    fn destroy_args(config: &StackConfig) -> Vec<String> {
        let mut args = vec![
            "destroy".to_string(),
            "-auto-approve".to_string(),
            "-no-color".to_string(),
            "-input=false".to_string(),
        ];
        for var_file in &config.var_files {
            args.push(format!("-var-file={}", var_file.display()));
        }
        args
    }

    fn output_args() -> Vec<String> {
        vec![
            "output".to_string(),
            "-json".to_string(),
            "-no-color".to_string(),
        ]
    }

    /// Run one terraform subcommand to completion, enforcing the configured
    /// timeout. Non-zero exit is an error carrying the captured stderr.
    async fn run(&self, config: &StackConfig, args: &[String]) -> InfraResult<String> {
        let subcommand = args.first().cloned().unwrap_or_default();
        let start = Instant::now();

        debug!(command = %subcommand, dir = %config.template_dir.display(), "Running terraform");

        let child = Command::new(&self.binary)
            .args(args)
            .current_dir(&config.template_dir)
            .env("AWS_DEFAULT_REGION", &config.region)
            .envs(&config.env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // If the run is cancelled, the dropped future must not leave a
            // terraform process behind
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| InfraError::Spawn {
                command: subcommand.clone(),
                source,
            })?;

        let timeout_secs = config.command_timeout.as_secs();
        let output = tokio::time::timeout(config.command_timeout, child.wait_with_output())
            .await
            .map_err(|_| InfraError::Timeout {
                command: subcommand.clone(),
                timeout_secs,
            })?
            .map_err(|source| InfraError::Spawn {
                command: subcommand.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let duration_ms = start.elapsed().as_millis() as u64;

        if !output.status.success() {
            return Err(InfraError::Terraform {
                command: subcommand,
                exit_code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        debug!(command = %subcommand, duration_ms, "terraform command completed");
        Ok(stdout)
    }

    /// Run a subcommand with the configured retry budget. Any failure is
    /// retried after a fixed delay, up to `max_retries` times.
    async fn run_with_retries(&self, config: &StackConfig, args: &[String]) -> InfraResult<String> {
        let mut attempt = 0u32;
        loop {
            match self.run(config, args).await {
                Ok(stdout) => return Ok(stdout),
                Err(err) if attempt < config.max_retries => {
                    attempt += 1;
                    warn!(
                        error = %err,
                        attempt,
                        max_retries = config.max_retries,
                        "terraform command failed, retrying"
                    );
                    tokio::time::sleep(config.retry_delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn outputs(&self, config: &StackConfig) -> InfraResult<StackOutputs> {
        let stdout = self.run(config, &Self::output_args()).await?;
        Ok(StackOutputs::from_terraform_json(&stdout)?)
    }
}

impl Default for TerraformCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provisioner for TerraformCli {
    async fn apply(&self, config: &StackConfig) -> InfraResult<StackOutputs> {
        info!(dir = %config.template_dir.display(), "Applying stack");
        self.run(config, &Self::init_args(config)).await?;
        self.run_with_retries(config, &Self::apply_args(config))
            .await?;
        let outputs = self.outputs(config).await?;
        info!(outputs = outputs.len(), "Apply complete");
        Ok(outputs)
    }

    async fn destroy(&self, config: &StackConfig) -> InfraResult<()> {
        info!(dir = %config.template_dir.display(), "Destroying stack");
        self.run(config, &Self::init_args(config)).await?;
        self.run_with_retries(config, &Self::destroy_args(config))
            .await?;
        info!("Destroy complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::BackendConfig;

    fn config_with_backend() -> StackConfig {
        StackConfig::new("../terraform", "us-east-2")
            .with_var_file("envs/dev/dev.tfvars")
            .with_backend(BackendConfig {
                bucket: "dev-state-bucket".to_string(),
                key: "tfstate/dev/test-infra.tfstate".to_string(),
                region: "us-east-2".to_string(),
            })
    }

    #[test]
    fn test_init_args_carry_backend_config() {
        let args = TerraformCli::init_args(&config_with_backend());
        assert_eq!(args[0], "init");
        assert!(args.contains(&"-reconfigure".to_string()));
        assert!(args.contains(&"-backend-config=bucket=dev-state-bucket".to_string()));
        assert!(args.contains(&"-backend-config=key=tfstate/dev/test-infra.tfstate".to_string()));
        assert!(args.contains(&"-backend-config=region=us-east-2".to_string()));
    }

    #[test]
    fn test_init_args_without_backend() {
        let config = StackConfig::new("../terraform", "us-east-2");
        let args = TerraformCli::init_args(&config);
        assert!(!args.iter().any(|a| a.starts_with("-backend-config")));
    }

    #[test]
    fn test_apply_and_destroy_args_carry_var_files() {
        let config = config_with_backend();
        let apply = TerraformCli::apply_args(&config);
        assert_eq!(apply[0], "apply");
        assert!(apply.contains(&"-auto-approve".to_string()));
        assert!(apply.contains(&"-var-file=envs/dev/dev.tfvars".to_string()));

        let destroy = TerraformCli::destroy_args(&config);
        assert_eq!(destroy[0], "destroy");
        assert!(destroy.contains(&"-var-file=envs/dev/dev.tfvars".to_string()));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported() {
        let cli = TerraformCli::with_binary("/nonexistent-binary-that-does-not-exist");
        let config = StackConfig::new(std::env::temp_dir(), "us-east-2");
        let err = cli
            .run(&config, &["init".to_string()])
            .await
            .expect_err("spawn should fail");
        assert!(matches!(err, InfraError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_stderr() {
        // `false` exits 1 with no output; any command name works for args[0]
        let cli = TerraformCli::with_binary("false");
        let config = StackConfig::new(std::env::temp_dir(), "us-east-2");
        let err = cli
            .run(&config, &["apply".to_string()])
            .await
            .expect_err("command should fail");
        match err {
            InfraError::Terraform {
                command, exit_code, ..
            } => {
                assert_eq!(command, "apply");
                assert_ne!(exit_code, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
