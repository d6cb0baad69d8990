//! Fleet management checks: SSM registration, output contract, scheduler.

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::warn;

use stackvet_core::poll_until;

use super::{Assertions, CheckContext};

/// Wait for the SSM agent to register the instance. Registration lags
/// instance boot, so a single query is not meaningful; the bounded poll
/// carries the wait. Exhaustion fails the check with the attempt count.
pub(super) fn ssm_managed<'a>(cx: &'a CheckContext<'a>) -> BoxFuture<'a, Assertions> {
    async move {
        let mut a = Assertions::new();
        let keys = &cx.expect.output_keys;

        let Some(instance_id) = a.require_output(cx.outputs, &keys.instance_id) else {
            return a;
        };

        let outcome = poll_until(cx.ssm_poll, cx.cancel, || async move {
            match cx.query.is_managed_by_ssm(instance_id).await {
                Ok(managed) => managed,
                Err(err) => {
                    // A transient API error consumes an attempt
                    warn!(error = %err, instance_id, "SSM manageability query failed");
                    false
                }
            }
        })
        .await;

        if outcome.satisfied {
            a.pass(format!(
                "instance {instance_id} registered with SSM after {} attempt(s)",
                outcome.attempts
            ));
        } else {
            a.fail(format!(
                "instance {instance_id} not managed by SSM after {} attempts",
                outcome.attempts
            ));
        }

        a
    }
    .boxed()
}

/// The critical outputs must be present, and the connect command must
/// target the provisioned instance in the configured region.
pub(super) fn outputs_present<'a>(cx: &'a CheckContext<'a>) -> BoxFuture<'a, Assertions> {
    async move {
        let mut a = Assertions::new();
        let keys = &cx.expect.output_keys;

        a.require_output(cx.outputs, &keys.vpc_id);
        a.require_output(cx.outputs, &keys.primary_eni_id);
        let instance_id = a.require_output(cx.outputs, &keys.instance_id);
        let command = a.require_output(cx.outputs, &keys.ssm_connect_command);

        if let (Some(instance_id), Some(command)) = (instance_id, command) {
            let expected = format!(
                "aws ssm start-session --target {} --region {}",
                instance_id, cx.region
            );
            a.eq("ssm connect command", expected.as_str(), command);
        }

        a
    }
    .boxed()
}

/// The start/stop scheduler is optional. When the start rule output is set,
/// its stop rule and Lambda must be set too; when unset, nothing to assert.
pub(super) fn scheduler<'a>(cx: &'a CheckContext<'a>) -> BoxFuture<'a, Assertions> {
    async move {
        let mut a = Assertions::new();
        let keys = &cx.expect.output_keys;

        match cx.outputs.try_get(&keys.scheduler_start_rule_arn) {
            Some(start_rule) => {
                a.pass(format!("scheduler enabled: start rule {start_rule}"));
                a.require_output(cx.outputs, &keys.scheduler_stop_rule_arn);
                a.require_output(cx.outputs, &keys.scheduler_lambda_arn);
            }
            None => a.pass("scheduler not enabled, nothing to validate"),
        }

        a
    }
    .boxed()
}
