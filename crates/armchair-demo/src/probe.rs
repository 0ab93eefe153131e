//! `--probe`: negotiate without a window and report what the adapter offers.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use armchair_engine::config::EngineConfig;
use armchair_engine::device::{
    AdapterCaps, Feature, LIMIT_FIELDS, NegotiationRequest, Negotiator, WgpuBackend,
    resolve_features, resolve_limits,
};

pub fn run() -> Result<()> {
    let mut negotiator = Negotiator::new(WgpuBackend::headless(), NegotiationRequest::permissive());
    let negotiated = negotiator
        .finish_blocking()
        .context("capability probe failed")?;

    let adapter = &negotiated.adapter;
    let limits = adapter.limits();
    let available: BTreeSet<Feature> = Feature::set_from(adapter.features());

    println!("adapter: {}", adapter.summary());
    println!("negotiated in {:.0} ms", negotiator.elapsed().as_secs_f64() * 1000.0);

    println!();
    println!("features:");
    for feature in Feature::ALL {
        let mark = if available.contains(&feature) { "yes" } else { " - " };
        println!("  [{mark}] {feature}");
    }

    println!();
    println!("limits:");
    for field in LIMIT_FIELDS {
        println!("  {:<52} {}", field.name, field.get(&limits));
    }

    // Would the interactive renderer accept this adapter?
    let renderer = EngineConfig::default().negotiation;
    let verdict = resolve_features(&available, &renderer.features).and_then(|_| {
        resolve_limits(&renderer.limits, &limits, renderer.base_limits.clone())
    });

    println!();
    match verdict {
        Ok(_) => println!("renderer requirements: satisfied"),
        Err(err) => println!("renderer requirements: NOT satisfied ({err})"),
    }

    Ok(())
}
