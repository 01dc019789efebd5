//! Curated field-position templates
//!
//! Templates are written by hand after inspecting a newly discovered type; the
//! core only reads them. A template is checked once at load time so extraction
//! can index into a matching candidate's ops without bounds surprises.

use serde::{Deserialize, Serialize};

use crate::constants::{DATA_PUSH_PREFIX, PUSHDATA_PREFIX, PUSH_NUMBER_MARKER};
use crate::error::{AnalysisError, Result};
use crate::normalize::signatures_match;
use crate::types::FieldTemplate;

impl FieldTemplate {
    /// Every configured position must fall inside the signature
    pub fn validate(&self) -> Result<()> {
        if self.length != self.ops.len() {
            return Err(AnalysisError::MalformedInput(format!(
                "template {}: length {} but {} ops",
                self.name,
                self.length,
                self.ops.len()
            )));
        }

        let positions = self
            .secrethash_pos
            .iter()
            .chain(self.public_keys1_pos.iter())
            .copied()
            .chain([self.locktime_pos, self.public_key2_pos]);

        for pos in positions {
            if pos >= self.length {
                return Err(AnalysisError::MalformedInput(format!(
                    "template {}: position {} outside signature of length {}",
                    self.name, pos, self.length
                )));
            }
        }

        let locktime_op = self.ops[self.locktime_pos].as_str();
        if !is_locktime_push(locktime_op) {
            return Err(AnalysisError::MalformedInput(format!(
                "template {}: locktime position {} holds {}, not a push",
                self.name, self.locktime_pos, locktime_op
            )));
        }

        Ok(())
    }

    /// Same length-then-elementwise rule as classification
    pub fn matches(&self, signature: &[String]) -> bool {
        self.length == signature.len() && signatures_match(&self.ops, signature)
    }
}

/// Normalized mnemonics that can carry a locktime value
fn is_locktime_push(mnemonic: &str) -> bool {
    mnemonic == PUSH_NUMBER_MARKER
        || mnemonic.starts_with(DATA_PUSH_PREFIX)
        || mnemonic.starts_with(PUSHDATA_PREFIX)
}

/// Read-only lookup table of field templates, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldTemplate>", into = "Vec<FieldTemplate>")]
pub struct TemplateCatalog {
    templates: Vec<FieldTemplate>,
}

impl TemplateCatalog {
    /// Build a catalog, rejecting any template with out-of-range positions
    pub fn new(templates: Vec<FieldTemplate>) -> Result<Self> {
        for template in &templates {
            template.validate()?;
        }
        Ok(Self { templates })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn templates(&self) -> &[FieldTemplate] {
        &self.templates
    }

    /// First template whose signature equals `signature`
    pub fn find(&self, signature: &[String]) -> Option<&FieldTemplate> {
        self.templates.iter().find(|t| t.matches(signature))
    }
}

impl TryFrom<Vec<FieldTemplate>> for TemplateCatalog {
    type Error = AnalysisError;

    fn try_from(templates: Vec<FieldTemplate>) -> Result<Self> {
        Self::new(templates)
    }
}

impl From<TemplateCatalog> for Vec<FieldTemplate> {
    fn from(catalog: TemplateCatalog) -> Self {
        catalog.templates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PUSH_NUMBER_MARKER;

    fn template(length: usize, locktime_pos: usize) -> FieldTemplate {
        let mut ops = vec!["OP_IF".to_string(); length];
        if let Some(op) = ops.get_mut(locktime_pos) {
            *op = PUSH_NUMBER_MARKER.to_string();
        }
        FieldTemplate {
            name: "Type2".to_string(),
            length,
            secrethash_pos: vec![1],
            locktime_pos,
            public_keys1_pos: vec![2],
            public_key2_pos: 0,
            ops,
        }
    }

    #[test]
    fn test_valid_template() {
        assert!(template(4, 3).validate().is_ok());
    }

    #[test]
    fn test_position_out_of_range() {
        let result = template(4, 4).validate();
        assert!(matches!(result, Err(AnalysisError::MalformedInput(_))));
    }

    #[test]
    fn test_length_disagrees_with_ops() {
        let mut t = template(4, 1);
        t.length = 5;
        assert!(t.validate().is_err());
        assert!(TemplateCatalog::new(vec![t]).is_err());
    }

    #[test]
    fn test_locktime_must_point_at_a_push() {
        let mut t = template(4, 3);
        for op in ["OP_DATA_4", "OP_PUSHDATA1", PUSH_NUMBER_MARKER] {
            t.ops[3] = op.to_string();
            assert!(t.validate().is_ok(), "{}", op);
        }

        t.ops[3] = "OP_CHECKSIG".to_string();
        assert!(matches!(t.validate(), Err(AnalysisError::MalformedInput(_))));
        assert!(TemplateCatalog::new(vec![t]).is_err());
    }

    #[test]
    fn test_find_requires_exact_signature() {
        let catalog = TemplateCatalog::new(vec![template(3, 1)]).unwrap();
        let sig = catalog.templates()[0].ops.clone();
        assert!(catalog.find(&sig).is_some());
        assert!(catalog.find(&sig[..2]).is_none());

        let mut other = sig.clone();
        other[2] = "OP_ELSE".to_string();
        assert!(catalog.find(&other).is_none());
    }

    #[test]
    fn test_deserialization_validates_positions() {
        let json = r#"[{
            "name": "Type2", "length": 2,
            "secrethash_pos": [5], "locktime_pos": 0,
            "public_keys1_pos": [], "public_key2_pos": 1,
            "ops": ["OP_IF", "OP_ENDIF"]
        }]"#;
        assert!(serde_json::from_str::<TemplateCatalog>(json).is_err());
    }
}
