//! Remote state backend checks.

use futures::future::BoxFuture;
use futures::FutureExt;

use super::{Assertions, CheckContext};

/// With a remote backend configured, no local state file may exist in the
/// template directory, and the state bucket must be reachable.
pub(super) fn remote_backend<'a>(cx: &'a CheckContext<'a>) -> BoxFuture<'a, Assertions> {
    async move {
        let mut a = Assertions::new();

        let state_file = cx.stack.template_dir.join("terraform.tfstate");
        if state_file.exists() {
            a.fail(format!(
                "local state file {} exists despite remote backend",
                state_file.display()
            ));
        } else {
            a.pass("no local terraform.tfstate".to_string());
        }

        match &cx.stack.backend {
            Some(backend) => match cx.query.bucket_exists(&backend.bucket).await {
                Ok(true) => a.pass(format!("state bucket {} exists", backend.bucket)),
                Ok(false) => a.fail(format!("state bucket {} does not exist", backend.bucket)),
                Err(err) => a.error("state bucket lookup", err),
            },
            None => a.fail("no remote backend configured"),
        }

        a
    }
    .boxed()
}
