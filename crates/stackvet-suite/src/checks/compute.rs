//! Compute instance checks: type, addressing, metadata service, IAM.

use futures::future::BoxFuture;
use futures::FutureExt;

use super::{Assertions, CheckContext};

/// Instance attributes: type, no public IP, hardened metadata service,
/// interface count, IAM instance profile, lifecycle state.
pub(super) fn ec2_instance<'a>(cx: &'a CheckContext<'a>) -> BoxFuture<'a, Assertions> {
    async move {
        let mut a = Assertions::new();
        let keys = &cx.expect.output_keys;

        let Some(instance_id) = a.require_output(cx.outputs, &keys.instance_id) else {
            return a;
        };

        let instance = match cx.query.instance(instance_id).await {
            Ok(instance) => instance,
            Err(err) => {
                a.error("instance lookup", err);
                return a;
            }
        };

        a.eq(
            "instance type",
            cx.expect.instance_type.as_str(),
            instance.instance_type.as_str(),
        );

        if instance.has_public_ip() {
            a.fail(format!(
                "instance has public IP {}",
                instance.public_ip.as_deref().unwrap_or_default()
            ));
        } else {
            a.pass("no public IP");
        }

        a.eq(
            "metadata http-tokens",
            cx.expect.http_tokens.as_str(),
            instance.http_tokens.as_str(),
        );
        a.eq(
            "metadata http-endpoint",
            cx.expect.http_endpoint.as_str(),
            instance.http_endpoint.as_str(),
        );
        a.eq(
            "network interface count",
            cx.expect.network_interface_count,
            instance.network_interfaces.len(),
        );

        match instance.iam_instance_profile.as_deref() {
            Some(profile) if !profile.is_empty() => {
                a.pass(format!("IAM instance profile {profile}"));
            }
            _ => a.fail("no IAM instance profile attached"),
        }

        a.eq("instance state", "running", instance.state.as_str());

        a
    }
    .boxed()
}

/// Private IP layout. Two expectation variants exist because the source
/// infrastructure shipped both: a total-address count on the primary
/// interface (with a required literal set) and a separate static-address
/// output list. Each is independently configurable.
pub(super) fn private_ips<'a>(cx: &'a CheckContext<'a>) -> BoxFuture<'a, Assertions> {
    async move {
        let mut a = Assertions::new();
        let keys = &cx.expect.output_keys;

        if let Some(primary) = &cx.expect.primary_interface_ips {
            let Some(instance_id) = a.require_output(cx.outputs, &keys.instance_id) else {
                // The static-output variant below needs no instance id
                return static_ip_assertions(cx, a);
            };

            match cx.query.instance(instance_id).await {
                Ok(instance) => match instance.network_interfaces.first() {
                    Some(eni) => {
                        if let Some(expected_eni) = cx.outputs.try_get(&keys.primary_eni_id) {
                            a.eq("primary ENI id", expected_eni, eni.id.as_str());
                        }

                        a.eq(
                            "primary interface private IP count",
                            primary.total,
                            eni.private_ips.len(),
                        );
                        for ip in &primary.must_include {
                            if eni.private_ips.iter().any(|observed| observed == ip) {
                                a.pass(format!("primary interface carries {ip}"));
                            } else {
                                a.fail(format!("primary interface missing {ip}"));
                            }
                        }
                    }
                    None => a.fail("instance has no network interfaces"),
                },
                Err(err) => a.error("instance lookup", err),
            }
        }

        static_ip_assertions(cx, a)
    }
    .boxed()
}

fn static_ip_assertions(cx: &CheckContext<'_>, mut a: Assertions) -> Assertions {
    let keys = &cx.expect.output_keys;

    if let Some(static_ips) = &cx.expect.static_ips {
        if let Some(ips) = a.require_output_list(cx.outputs, &keys.static_private_ips) {
            a.eq("static private IP count", static_ips.count, ips.len());
            for (i, ip) in ips.iter().enumerate() {
                if ip.starts_with(&static_ips.cidr_prefix) {
                    a.pass(format!("static IP [{i}] {ip} within VPC block"));
                } else {
                    a.fail(format!(
                        "static IP [{i}] {ip} outside VPC block {}*",
                        static_ips.cidr_prefix
                    ));
                }
            }
        }
    }

    a
}

/// The instance must carry at least one security group.
pub(super) fn security_groups<'a>(cx: &'a CheckContext<'a>) -> BoxFuture<'a, Assertions> {
    async move {
        let mut a = Assertions::new();
        let keys = &cx.expect.output_keys;

        let Some(instance_id) = a.require_output(cx.outputs, &keys.instance_id) else {
            return a;
        };

        match cx.query.instance(instance_id).await {
            Ok(instance) => {
                if instance.security_group_ids.is_empty() {
                    a.fail("no security groups attached");
                } else {
                    a.pass(format!(
                        "security groups: {}",
                        instance.security_group_ids.join(", ")
                    ));
                }
            }
            Err(err) => a.error("instance lookup", err),
        }

        a
    }
    .boxed()
}
