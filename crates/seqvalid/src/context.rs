//! Scoped validation context.
//!
//! The engine pushes a [`Frame`] when it enters a set or a Bioseq and pops
//! it on the way out. [`ContextStack::current`] merges the frames: scalar
//! fields take the innermost value that is set, list fields accumulate from
//! the root down.

use crate::config::Options;
use crate::model::{AccessionClass, BioSource, Genome, MolInfo, SetClass, Tech};

/// What one level of the record tree contributes to the context.
#[derive(Debug, Clone, Default)]
pub struct Frame<'a> {
    pub biosource: Option<&'a BioSource>,
    pub molinfo: Option<&'a MolInfo>,
    pub set_class: Option<SetClass>,
    pub accession_class: Option<AccessionClass>,
    /// Label used as the accession of findings raised at this level.
    pub accession: Option<String>,
    pub genetic_code: Option<u8>,
    pub keywords: Vec<&'a str>,
    pub has_pub: bool,
}

impl<'a> Frame<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_biosource(mut self, biosource: Option<&'a BioSource>) -> Self {
        self.biosource = biosource;
        self
    }

    pub fn with_molinfo(mut self, molinfo: Option<&'a MolInfo>) -> Self {
        self.molinfo = molinfo;
        self
    }

    pub fn with_set_class(mut self, class: SetClass) -> Self {
        self.set_class = Some(class);
        self
    }

    pub fn with_accession(mut self, label: impl Into<String>, class: AccessionClass) -> Self {
        self.accession = Some(label.into());
        self.accession_class = Some(class);
        self
    }

    pub fn with_genetic_code(mut self, code: Option<u8>) -> Self {
        self.genetic_code = code;
        self
    }
}

/// Merged view of the stack, handed to rules.
#[derive(Debug, Clone)]
pub struct Context<'a> {
    pub biosource: Option<&'a BioSource>,
    pub molinfo: Option<&'a MolInfo>,
    /// Innermost enclosing set class.
    pub set_class: Option<SetClass>,
    /// Enclosing set classes, outermost first.
    pub set_classes: Vec<SetClass>,
    pub accession_class: AccessionClass,
    pub accession: String,
    /// Genetic code from the CDS-independent context (organism and genome).
    pub genetic_code: Option<u8>,
    pub keywords: Vec<&'a str>,
    pub has_pub: bool,
    pub options: Options,
}

impl<'a> Context<'a> {
    /// True when a taxonomy id is attached to the organism in effect.
    pub fn has_taxon(&self) -> bool {
        self.biosource.and_then(|b| b.org.taxid()).is_some()
    }

    pub fn tech(&self) -> Tech {
        self.molinfo.map(|m| m.tech).unwrap_or_default()
    }

    pub fn genome(&self) -> Genome {
        self.biosource.map(|b| b.genome).unwrap_or_default()
    }

    pub fn lineage(&self) -> &'a str {
        self.biosource.map(|b| b.org.lineage()).unwrap_or_default()
    }

    pub fn taxname(&self) -> &'a str {
        self.biosource.map(|b| b.org.taxname()).unwrap_or_default()
    }

    pub fn in_set(&self, class: SetClass) -> bool {
        self.set_classes.contains(&class)
    }

    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k.eq_ignore_ascii_case(keyword))
    }

    pub fn option(&self, flag: Options) -> bool {
        self.options.contains(flag)
    }

    pub fn is_wgs(&self) -> bool {
        self.tech() == Tech::Wgs
    }
}

/// Stack of frames owned by one validation run.
#[derive(Debug)]
pub struct ContextStack<'a> {
    frames: Vec<Frame<'a>>,
    options: Options,
}

impl<'a> ContextStack<'a> {
    pub fn new(options: Options) -> Self {
        Self {
            frames: Vec::new(),
            options,
        }
    }

    pub fn push(&mut self, frame: Frame<'a>) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Frame<'a>> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current(&self) -> Context<'a> {
        let frames = self.frames.as_slice();
        Context {
            biosource: innermost(frames, |f| f.biosource),
            molinfo: innermost(frames, |f| f.molinfo),
            set_class: innermost(frames, |f| f.set_class),
            set_classes: frames.iter().filter_map(|f| f.set_class).collect(),
            accession_class: innermost(frames, |f| f.accession_class).unwrap_or(AccessionClass::Local),
            accession: innermost(frames, |f| f.accession.clone()).unwrap_or_default(),
            genetic_code: innermost(frames, |f| f.genetic_code),
            keywords: frames.iter().flat_map(|f| f.keywords.iter().copied()).collect(),
            has_pub: frames.iter().any(|f| f.has_pub),
            options: self.options,
        }
    }
}

fn innermost<'a, T>(frames: &[Frame<'a>], get: impl Fn(&Frame<'a>) -> Option<T>) -> Option<T> {
    frames.iter().rev().find_map(get)
}

/// Genetic code an organism uses in a given genome location.
pub fn genetic_code_for(biosource: &BioSource) -> Option<u8> {
    let orgname = biosource.org.orgname.as_ref()?;
    if biosource.genome.uses_mito_code() {
        orgname.mgcode.or(orgname.gcode)
    } else if biosource.genome.uses_plastid_code() {
        Some(orgname.pgcode.unwrap_or(11))
    } else {
        orgname.gcode
    }
}
