//! Structural checks run before a graph is handed out.

use std::collections::{BTreeMap, HashMap};

use nn_core::{LinkKey, Rate, RateHandle, RateKind};

use crate::error::{DuplicateLink, GraphError, GraphResult};
use crate::graph::RateEntry;

/// Every approximate rate must carry its constituents.
pub(crate) fn validate_children(rates: &[RateHandle]) -> GraphResult<()> {
    for rate in rates {
        if rate.kind() != RateKind::Approximate {
            continue;
        }
        let Some(approx) = rate.as_approximate() else {
            return Err(GraphError::MissingChildRate {
                approx: rate.name().to_string(),
                child: "constituent list".into(),
            });
        };
        if approx.children().is_empty() {
            return Err(GraphError::MissingChildRate {
                approx: rate.name().to_string(),
                child: "constituent list".into(),
            });
        }
    }
    Ok(())
}

/// No two top-level rates may share a link unless the link is allow-listed.
pub(crate) fn validate_links(rates: &[RateHandle], allowed: &[LinkKey]) -> GraphResult<()> {
    let mut by_link: BTreeMap<LinkKey, Vec<String>> = BTreeMap::new();
    for rate in rates {
        by_link
            .entry(rate.link_key())
            .or_default()
            .push(rate.name().to_string());
    }
    let links: Vec<DuplicateLink> = by_link
        .into_iter()
        .filter(|(link, names)| names.len() > 1 && !allowed.contains(link))
        .map(|(link, rates)| DuplicateLink { link, rates })
        .collect();
    if links.is_empty() {
        Ok(())
    } else {
        Err(GraphError::DuplicateLinks { links })
    }
}

/// Emitted names must be unique across every entry.
pub(crate) fn validate_names(entries: &[RateEntry]) -> GraphResult<()> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for e in entries {
        *counts.entry(e.name()).or_default() += 1;
    }
    let mut names: Vec<String> = counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(name, _)| name.to_string())
        .collect();
    if names.is_empty() {
        return Ok(());
    }
    names.sort();
    Err(GraphError::DuplicateRateNames { names })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nn_core::{CustomRate, Nuclide, Reaction};
    use std::sync::Arc;

    fn decay(name: &str) -> RateHandle {
        Arc::new(CustomRate::constant(
            Reaction::new(vec![Nuclide::neutron()], vec![Nuclide::proton()]).with_name(name),
            1.0,
        ))
    }

    #[test]
    fn duplicate_link_names_all_rates() {
        let err = validate_links(&[decay("a"), decay("b")], &[]).unwrap_err();
        match err {
            GraphError::DuplicateLinks { links } => {
                assert_eq!(links.len(), 1);
                assert_eq!(links[0].rates, ["a", "b"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn allow_listed_link_passes() {
        let link = LinkKey::new(&[Nuclide::neutron()], &[Nuclide::proton()]);
        assert!(validate_links(&[decay("a"), decay("b")], &[link]).is_ok());
    }
}
