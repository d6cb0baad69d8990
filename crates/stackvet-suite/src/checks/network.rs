//! Network topology checks: VPC, subnets, endpoints.

use std::collections::BTreeMap;

use futures::future::BoxFuture;
use futures::FutureExt;

use stackvet_core::EndpointType;

use super::{Assertions, CheckContext};

/// The vpc_cidr output and the live VPC must both carry the expected block.
pub(super) fn vpc_config<'a>(cx: &'a CheckContext<'a>) -> BoxFuture<'a, Assertions> {
    async move {
        let mut a = Assertions::new();
        let keys = &cx.expect.output_keys;

        if let Some(vpc_cidr) = a.require_output(cx.outputs, &keys.vpc_cidr) {
            a.eq("vpc_cidr output", cx.expect.vpc_cidr.as_str(), vpc_cidr);
        }

        if let Some(vpc_id) = a.require_output(cx.outputs, &keys.vpc_id) {
            match cx.query.vpc(vpc_id).await {
                Ok(vpc) => a.eq(
                    "live VPC CIDR",
                    cx.expect.vpc_cidr.as_str(),
                    vpc.cidr.as_str(),
                ),
                Err(err) => a.error("VPC lookup", err),
            }
        }

        a
    }
    .boxed()
}

/// Private subnets are order-correlated with their expected CIDRs; public
/// subnets are compared as a set.
pub(super) fn subnet_layout<'a>(cx: &'a CheckContext<'a>) -> BoxFuture<'a, Assertions> {
    async move {
        let mut a = Assertions::new();
        let keys = &cx.expect.output_keys;

        if let Some(private_ids) = a.require_output_list(cx.outputs, &keys.private_subnet_ids) {
            a.eq(
                "private subnet count",
                cx.expect.private_subnet_cidrs.len(),
                private_ids.len(),
            );

            for (i, subnet_id) in private_ids.iter().enumerate() {
                let Some(expected) = cx.expect.private_subnet_cidrs.get(i) else {
                    continue;
                };
                match cx.query.subnet(subnet_id).await {
                    Ok(subnet) => {
                        if &subnet.cidr == expected {
                            a.pass(format!("private subnet [{i}] {subnet_id}: {}", subnet.cidr));
                        } else {
                            a.fail(format!(
                                "private subnet [{i}] {subnet_id}: expected {expected}, got {}",
                                subnet.cidr
                            ));
                        }
                    }
                    Err(err) => a.error(&format!("private subnet [{i}] lookup"), err),
                }
            }
        }

        if let Some(public_ids) = a.require_output_list(cx.outputs, &keys.public_subnet_ids) {
            a.eq(
                "public subnet count",
                cx.expect.public_subnet_cidrs.len(),
                public_ids.len(),
            );

            let mut observed = Vec::new();
            for subnet_id in public_ids {
                match cx.query.subnet(subnet_id).await {
                    Ok(subnet) => observed.push(subnet.cidr),
                    Err(err) => a.error("public subnet lookup", err),
                }
            }

            let mut expected = cx.expect.public_subnet_cidrs.clone();
            expected.sort();
            observed.sort();
            if expected == observed {
                a.pass(format!("public subnet CIDRs: {}", observed.join(", ")));
            } else {
                a.fail(format!(
                    "public subnet CIDRs: expected {{{}}}, got {{{}}}",
                    expected.join(", "),
                    observed.join(", ")
                ));
            }
        }

        a
    }
    .boxed()
}

/// Exactly one Interface endpoint per required service, exactly one Gateway
/// endpoint for each gateway service, and a non-empty id output per service.
pub(super) fn vpc_endpoints<'a>(cx: &'a CheckContext<'a>) -> BoxFuture<'a, Assertions> {
    async move {
        let mut a = Assertions::new();
        let keys = &cx.expect.output_keys;

        let Some(vpc_id) = a.require_output(cx.outputs, &keys.vpc_id) else {
            return a;
        };

        let endpoints = match cx.query.vpc_endpoints(vpc_id).await {
            Ok(endpoints) => endpoints,
            Err(err) => {
                a.error("endpoint listing", err);
                return a;
            }
        };

        // service label -> count per attachment type
        let mut interface_counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut gateway_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for endpoint in &endpoints {
            let label = endpoint.service_label();
            match endpoint.endpoint_type {
                EndpointType::Interface => *interface_counts.entry(label).or_default() += 1,
                EndpointType::Gateway => *gateway_counts.entry(label).or_default() += 1,
                EndpointType::Other(_) => {}
            }
        }

        for service in &cx.expect.interface_endpoint_services {
            let count = interface_counts.get(service.as_str()).copied().unwrap_or(0);
            if count == 1 {
                a.pass(format!("one Interface endpoint for {service}"));
            } else {
                a.fail(format!(
                    "expected exactly one Interface endpoint for {service}, found {count}"
                ));
            }
            a.require_output(cx.outputs, &keys.endpoint_id(service));
        }

        for service in &cx.expect.gateway_endpoint_services {
            let count = gateway_counts.get(service.as_str()).copied().unwrap_or(0);
            if count == 1 {
                a.pass(format!("one Gateway endpoint for {service}"));
            } else {
                a.fail(format!(
                    "expected exactly one Gateway endpoint for {service}, found {count}"
                ));
            }
            a.require_output(cx.outputs, &keys.endpoint_id(service));
        }

        a
    }
    .boxed()
}
