//! Partition file reader (§6): assigns every atomic proposition of a
//! formula to the environment (`X`, inputs) or the controller (`Y`,
//! outputs).
//!
//! A partition file is line-oriented:
//!
//! ```text
//! .inputs: x1 x2 x3
//! .outputs: y1 y2
//! ```
//!
//! Blank lines are ignored; the two directive lines may appear in either
//! order, each at most once.

use std::collections::HashSet;
use std::io::BufRead;

use crate::error::PartitionError;
use crate::formula::{AtomId, Context};

/// The environment/controller split of a formula's atoms, as read from a
/// partition file or assembled programmatically.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    inputs: Vec<String>,
    outputs: Vec<String>,
}

impl Partition {
    /// Builds a partition from explicit input/output name lists, rejecting
    /// a name that is both an input and an output, or repeated within one
    /// side.
    pub fn new(inputs: Vec<String>, outputs: Vec<String>) -> Result<Self, PartitionError> {
        let mut seen = HashSet::new();
        for name in inputs.iter().chain(outputs.iter()) {
            if !seen.insert(name.as_str()) {
                return Err(PartitionError::DuplicateAtom(name.clone()));
            }
        }
        Ok(Self { inputs, outputs })
    }

    /// Parses a partition file from `reader`.
    pub fn read<R: BufRead>(reader: R) -> Result<Self, PartitionError> {
        let mut inputs: Option<Vec<String>> = None;
        let mut outputs: Option<Vec<String>> = None;

        for line in reader.lines() {
            let line = line.map_err(|e| PartitionError::Malformed(e.to_string()))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(rest) = trimmed.strip_prefix(".inputs:") {
                if inputs.is_some() {
                    return Err(PartitionError::Malformed("duplicate .inputs: line".to_owned()));
                }
                inputs = Some(rest.split_whitespace().map(str::to_owned).collect());
            } else if let Some(rest) = trimmed.strip_prefix(".outputs:") {
                if outputs.is_some() {
                    return Err(PartitionError::Malformed("duplicate .outputs: line".to_owned()));
                }
                outputs = Some(rest.split_whitespace().map(str::to_owned).collect());
            } else {
                return Err(PartitionError::Malformed(format!("unrecognized line: {trimmed:?}")));
            }
        }

        let inputs = inputs.ok_or_else(|| PartitionError::Malformed("missing .inputs: line".to_owned()))?;
        let outputs = outputs.ok_or_else(|| PartitionError::Malformed("missing .outputs: line".to_owned()))?;
        Self::new(inputs, outputs)
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Resolves every atom interned in `ctx` against this partition,
    /// returning the dense `AtomId`s on each side. An atom present in
    /// `ctx` but named on neither side is a fatal [`PartitionError`].
    pub fn resolve(&self, ctx: &Context) -> Result<(Vec<AtomId>, Vec<AtomId>), PartitionError> {
        let input_set: HashSet<&str> = self.inputs.iter().map(String::as_str).collect();
        let output_set: HashSet<&str> = self.outputs.iter().map(String::as_str).collect();

        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for (name, id) in ctx.atoms_by_name() {
            if input_set.contains(name) {
                xs.push(id);
            } else if output_set.contains(name) {
                ys.push(id);
            } else {
                return Err(PartitionError::UnknownAtom(name.to_owned()));
            }
        }
        Ok((xs, ys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_inputs_and_outputs() {
        let text = ".inputs: a b\n.outputs: c\n";
        let partition = Partition::read(Cursor::new(text)).unwrap();
        assert_eq!(partition.inputs(), &["a".to_owned(), "b".to_owned()]);
        assert_eq!(partition.outputs(), &["c".to_owned()]);
    }

    #[test]
    fn order_of_directives_does_not_matter() {
        let text = ".outputs: c\n.inputs: a b\n";
        let partition = Partition::read(Cursor::new(text)).unwrap();
        assert_eq!(partition.inputs(), &["a".to_owned(), "b".to_owned()]);
    }

    #[test]
    fn missing_directive_is_malformed() {
        let text = ".inputs: a b\n";
        assert!(Partition::read(Cursor::new(text)).is_err());
    }

    #[test]
    fn atom_in_neither_side_is_rejected() {
        let mut ctx = Context::new();
        ctx.make_atom("a");
        ctx.make_atom("z");
        let partition = Partition::new(vec!["a".to_owned()], vec![]).unwrap();
        assert!(partition.resolve(&ctx).is_err());
    }

    #[test]
    fn name_on_both_sides_is_rejected() {
        assert!(Partition::new(vec!["a".to_owned()], vec!["a".to_owned()]).is_err());
    }
}
