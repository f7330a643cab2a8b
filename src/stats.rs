//! Intersection statistics, gathered from the scene graph after tracing

use std::collections::BTreeMap;

use crate::geom::GeomNode;

/// Tests and hits of one primitive kind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub tests: u64,
    pub hits: u64,
}

impl Counts {
    fn add(&mut self, (tests, hits): (u64, u64)) {
        self.tests += tests;
        self.hits += hits;
    }

    fn hit_percent(&self) -> f64 {
        100.0 * self.hits as f64 / self.tests as f64
    }
}

/// Counts per primitive kind, split between leaves and aggregates.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GeomStats {
    prims: BTreeMap<&'static str, Counts>,
    aggregates: BTreeMap<&'static str, Counts>,
}

impl GeomStats {
    /// Sums the counters of `root` and everything beneath it.
    pub fn collect(root: &GeomNode) -> Self {
        let mut stats = Self::default();
        stats.visit(root);
        stats
    }

    fn visit(&mut self, node: &GeomNode) {
        let table = if node.is_aggregate() {
            &mut self.aggregates
        } else {
            &mut self.prims
        };
        table.entry(node.kind_name()).or_default().add(node.stats());
        node.for_each_child(&mut |child| self.visit(child));
    }

    pub fn get(&self, name: &str) -> Option<Counts> {
        self.prims
            .get(name)
            .or_else(|| self.aggregates.get(name))
            .copied()
    }

    /// Totals over leaf primitives only.
    pub fn total(&self) -> Counts {
        self.prims.values().fold(Counts::default(), |mut acc, c| {
            acc.add((c.tests, c.hits));
            acc
        })
    }

    /// Report lines, one per kind that was tested at least once.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .aggregates
            .iter()
            .chain(self.prims.iter())
            .filter(|(_, counts)| counts.tests > 0)
            .map(|(name, counts)| {
                format!(
                    "{} intersection tests:\t{} ({} hit, {:.2}%)",
                    capitalize(name),
                    counts.tests,
                    counts.hits,
                    counts.hit_percent()
                )
            })
            .collect();

        let total = self.total();
        let mut summary = format!("Total prim. intersection tests:\t{}", total.tests);
        if total.tests > 0 {
            summary.push_str(&format!(
                " ({} hit, {:.2}%)",
                total.hits,
                total.hit_percent()
            ));
        }
        lines.push(summary);
        lines
    }

    pub fn report(&self) {
        for line in self.lines() {
            log::info!("{line}");
        }
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
