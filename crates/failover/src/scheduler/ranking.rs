//! Candidate ordering for one fetch.

use std::sync::Arc;

use crate::models::HealthSnapshot;
use crate::registry::Source;

/// An enabled source paired with the statistics it is ranked on.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub source: Arc<Source>,
    pub snapshot: HealthSnapshot,
}

/// Order candidates for one fetch.
///
/// Pinned sources come first by (priority, name). The rest are ordered by
/// success rate, highest first, and grouped into tie clusters: a cluster
/// holds every following source whose rate is within `tie_threshold` of the
/// cluster's best. Inside a cluster sources are ordered by average response
/// time, fastest first, with unmeasured sources last. Remaining ties keep
/// (priority, name) order.
///
/// Every step is a stable sort over a total order, so the result is a pure
/// function of the inputs, and a source whose rate is better by at least the
/// threshold always ranks ahead.
pub fn rank(candidates: Vec<Candidate>, tie_threshold: f64) -> Vec<Candidate> {
    let (mut pinned, mut rest): (Vec<_>, Vec<_>) =
        candidates.into_iter().partition(|c| c.source.is_pinned());

    pinned.sort_by(|a, b| by_priority(&a.source, &b.source));
    rest.sort_by(|a, b| by_priority(&a.source, &b.source));
    rest.sort_by(|a, b| b.snapshot.success_rate.total_cmp(&a.snapshot.success_rate));

    let mut ranked = pinned;
    let mut cluster: Vec<Candidate> = Vec::new();
    for candidate in rest {
        let splits = cluster.first().is_some_and(|leader| {
            leader.snapshot.success_rate - candidate.snapshot.success_rate >= tie_threshold
        });
        if splits {
            flush_cluster(&mut cluster, &mut ranked);
        }
        cluster.push(candidate);
    }
    flush_cluster(&mut cluster, &mut ranked);

    ranked
}

fn flush_cluster(cluster: &mut Vec<Candidate>, ranked: &mut Vec<Candidate>) {
    cluster.sort_by_key(|c| {
        let latency = c.snapshot.average_response_time;
        (latency.is_none(), latency)
    });
    ranked.append(cluster);
}

/// Static configuration order: ascending priority, then name.
pub fn by_priority(a: &Source, b: &Source) -> std::cmp::Ordering {
    a.priority()
        .cmp(&b.priority())
        .then_with(|| a.name().cmp(b.name()))
}
