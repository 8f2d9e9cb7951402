//! Module implementing gathered metric families.
//!
//! See [`MetricFamily`] for details.

use std::collections::{HashMap, HashSet};

use super::constant::{ConstMetric, Value};
use super::MetricType;
use crate::error::GatherError;
use crate::registry::Prefix;

/// Representation of the OpenMetrics *MetricFamily* data type.
///
/// A [`MetricFamily`] is the set of samples gathered in one scrape sharing the
/// same name, help text and type, differentiated by their label values.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    name: String,
    help: String,
    metric_type: MetricType,
    label_names: Vec<String>,
    samples: Vec<Sample>,
}

impl MetricFamily {
    /// Returns the fully-qualified name of the family.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the help text of the family.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Returns the metric type of the family.
    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    /// Returns the label names shared by all samples.
    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// Returns the samples, ordered by label values.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

/// One data point of a [`MetricFamily`].
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    label_values: Vec<String>,
    value: Value,
}

impl Sample {
    /// Returns the label values, in the family's label name order.
    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    /// Returns the sample value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Iterates `(label name, label value)` pairs.
    pub fn labels<'a>(
        &'a self,
        family: &'a MetricFamily,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        family
            .label_names
            .iter()
            .map(String::as_str)
            .zip(self.label_values.iter().map(String::as_str))
    }
}

/// Groups samples of one scrape into families.
#[derive(Debug, Default)]
pub(crate) struct FamilyBuilder {
    families: HashMap<String, MetricFamily>,
    seen: HashSet<(String, Vec<String>)>,
}

impl FamilyBuilder {
    pub(crate) fn push(
        &mut self,
        prefix: Option<&Prefix>,
        metric: ConstMetric,
    ) -> Result<(), GatherError> {
        let (desc, metric_type, value, label_values) = metric.into_parts();

        let name = match prefix {
            Some(prefix) => format!("{}_{}", prefix.as_str(), desc.name()),
            None => desc.name().to_string(),
        };

        if !self.seen.insert((name.clone(), label_values.clone())) {
            return Err(GatherError::DuplicateSample { name, label_values });
        }

        let family = self
            .families
            .entry(name.clone())
            .or_insert_with(|| MetricFamily {
                name: name.clone(),
                help: desc.help().to_string(),
                metric_type,
                label_names: desc.label_names().iter().map(|l| l.to_string()).collect(),
                samples: Vec::new(),
            });

        if family.metric_type != metric_type
            || family.help != desc.help()
            || family.label_names.len() != desc.label_names().len()
        {
            return Err(GatherError::InconsistentFamily(name));
        }

        family.samples.push(Sample {
            label_values,
            value,
        });

        Ok(())
    }

    pub(crate) fn finish(self) -> Vec<MetricFamily> {
        let mut families: Vec<MetricFamily> = self.families.into_values().collect();
        families.sort_by(|a, b| a.name.cmp(&b.name));
        for family in families.iter_mut() {
            family
                .samples
                .sort_by(|a, b| a.label_values.cmp(&b.label_values));
        }
        families
    }
}
