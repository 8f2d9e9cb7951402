//! Open Metrics text format implementation.
//!
//! ```
//! # use digitalocean_exporter::encoding::text::encode;
//! # use digitalocean_exporter::registry::Registry;
//! #
//! let registry = Registry::default();
//! let families = registry.gather().into_result().unwrap();
//!
//! let mut buffer = String::new();
//! encode(&mut buffer, &families).unwrap();
//!
//! assert_eq!("# EOF\n", buffer);
//! ```

use std::fmt::Write;

use super::write_escaped;
use crate::metrics::constant::Value;
use crate::metrics::family::{MetricFamily, Sample};

/// Media type of the text format produced by [`encode`].
pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Encode the given metric families in the OpenMetrics text format,
/// terminated by `# EOF`.
pub fn encode<W>(writer: &mut W, families: &[MetricFamily]) -> Result<(), std::fmt::Error>
where
    W: Write,
{
    for family in families {
        encode_family(writer, family)?;
    }

    writer.write_str("# EOF\n")?;

    Ok(())
}

fn encode_family<W: Write>(writer: &mut W, family: &MetricFamily) -> Result<(), std::fmt::Error> {
    writer.write_str("# HELP ")?;
    writer.write_str(family.name())?;
    writer.write_str(" ")?;
    write_escaped(writer, family.help())?;
    writer.write_str("\n")?;

    writer.write_str("# TYPE ")?;
    writer.write_str(family.name())?;
    writer.write_str(" ")?;
    writer.write_str(family.metric_type().as_str())?;
    writer.write_str("\n")?;

    for sample in family.samples() {
        encode_sample(writer, family, sample)?;
    }

    Ok(())
}

fn encode_sample<W: Write>(
    writer: &mut W,
    family: &MetricFamily,
    sample: &Sample,
) -> Result<(), std::fmt::Error> {
    writer.write_str(family.name())?;

    let mut labels = sample.labels(family).peekable();
    if labels.peek().is_some() {
        writer.write_str("{")?;
        let mut first = true;
        for (name, value) in labels {
            if !first {
                writer.write_str(",")?;
            }
            first = false;

            writer.write_str(name)?;
            writer.write_str("=\"")?;
            write_escaped(writer, value)?;
            writer.write_str("\"")?;
        }
        writer.write_str("}")?;
    }

    writer.write_str(" ")?;
    encode_value(writer, sample.value())?;
    writer.write_str("\n")?;

    Ok(())
}

fn encode_value<W: Write>(writer: &mut W, value: &Value) -> Result<(), std::fmt::Error> {
    match *value {
        Value::Int(v) => writer.write_str(itoa::Buffer::new().format(v)),
        Value::Float(v) if v.is_nan() => writer.write_str("NaN"),
        Value::Float(v) if v.is_infinite() => {
            writer.write_str(if v.is_sign_positive() { "+Inf" } else { "-Inf" })
        }
        Value::Float(v) => writer.write_str(dtoa::Buffer::new().format(v)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{Collector, DescSender, MetricSender};
    use crate::metrics::constant::ConstMetric;
    use crate::registry::{Descriptor, Registry};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Values {
        desc: Arc<Descriptor>,
        values: Vec<(&'static str, Value)>,
    }

    impl Collector for Values {
        fn describe(&self, descs: &DescSender) {
            descs.send(self.desc.clone()).unwrap();
        }

        fn collect(&self, metrics: &MetricSender) {
            for (label, value) in self.values.iter() {
                let metric =
                    ConstMetric::gauge(self.desc.clone(), *value, vec![label.to_string()]).unwrap();
                metrics.send(metric.into()).unwrap();
            }
        }
    }

    fn encode_values(values: Vec<(&'static str, Value)>) -> String {
        let registry = Registry::default();
        registry
            .register(Box::new(Values {
                desc: Arc::new(Descriptor::new(
                    "my_gauge",
                    "My \"gauge\"\\help",
                    vec!["name".into()],
                )),
                values,
            }))
            .unwrap();

        let mut buffer = String::new();
        encode(&mut buffer, &registry.gather().into_result().unwrap()).unwrap();
        buffer
    }

    #[test]
    fn encode_gauges() {
        let encoded = encode_values(vec![
            ("a", Value::Int(-3)),
            ("b", Value::Float(1.5)),
            ("c\"\n", Value::Int(0)),
        ]);

        let expected = "# HELP my_gauge My \\\"gauge\\\"\\\\help\n".to_owned()
            + "# TYPE my_gauge gauge\n"
            + "my_gauge{name=\"a\"} -3\n"
            + "my_gauge{name=\"b\"} 1.5\n"
            + "my_gauge{name=\"c\\\"\\n\"} 0\n"
            + "# EOF\n";
        assert_eq!(expected, encoded);
    }

    #[test]
    fn encode_special_floats() {
        let encoded = encode_values(vec![
            ("a", Value::Float(f64::NAN)),
            ("b", Value::Float(f64::INFINITY)),
            ("c", Value::Float(f64::NEG_INFINITY)),
        ]);

        assert!(encoded.contains("my_gauge{name=\"a\"} NaN\n"));
        assert!(encoded.contains("my_gauge{name=\"b\"} +Inf\n"));
        assert!(encoded.contains("my_gauge{name=\"c\"} -Inf\n"));
    }

    #[test]
    fn encode_without_labels() {
        let family_less = encode_family_without_labels();
        assert_eq!(
            "# HELP answer The answer.\n# TYPE answer gauge\nanswer 42\n# EOF\n",
            family_less
        );
    }

    fn encode_family_without_labels() -> String {
        #[derive(Debug)]
        struct Answer(Arc<Descriptor>);

        impl Collector for Answer {
            fn describe(&self, descs: &DescSender) {
                descs.send(self.0.clone()).unwrap();
            }

            fn collect(&self, metrics: &MetricSender) {
                let metric = ConstMetric::gauge(self.0.clone(), 42_u64, vec![]).unwrap();
                metrics.send(metric.into()).unwrap();
            }
        }

        let registry = Registry::default();
        registry
            .register(Box::new(Answer(Arc::new(Descriptor::new(
                "answer",
                "The answer.",
                vec![],
            )))))
            .unwrap();

        let mut buffer = String::new();
        encode(&mut buffer, registry.gather().families()).unwrap();
        buffer
    }
}
