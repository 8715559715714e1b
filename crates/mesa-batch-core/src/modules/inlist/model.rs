use std::fmt::Write as _;

const DEFAULT_INDENT: &str = "    ";
const DISABLE_MARKER: char = '!';

/// Namelists in the order MESA documents them; new ones are slotted in by this rank.
pub const NAMELIST_ORDER: [&str; 5] = ["star_job", "eos", "kap", "controls", "pgstar"];

/// One `key = value` line, active or disabled with a leading `!`.
///
/// Lines read from a file keep their original text until they are changed,
/// so untouched assignments render byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub(super) indent: String,
    pub(super) key: String,
    pub(super) value: String,
    pub(super) enabled: bool,
    pub(super) comment: Option<String>,
    pub(super) raw: Option<String>,
}

impl Assignment {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            indent: DEFAULT_INDENT.to_string(),
            key: key.into(),
            value: value.into(),
            enabled: true,
            comment: None,
            raw: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Lowercased key with whitespace removed, e.g. `overshoot_f(1)`.
    pub fn normalized_key(&self) -> String {
        normalize_key(&self.key)
    }

    /// Key without its array index, e.g. `overshoot_f`.
    pub fn base_name(&self) -> String {
        base_name(&self.key)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        let value = value.into();
        if self.value == value {
            return;
        }
        self.value = value;
        self.raw = None;
    }

    pub fn enable(&mut self) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        self.raw = None;
    }

    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        if let Some(raw) = self.raw.take() {
            let indent_len = raw.len() - raw.trim_start().len();
            let mut disabled = String::with_capacity(raw.len() + 1);
            disabled.push_str(&raw[..indent_len]);
            disabled.push(DISABLE_MARKER);
            disabled.push_str(&raw[indent_len..]);
            self.raw = Some(disabled);
        }
    }

    pub fn render(&self) -> String {
        if let Some(raw) = &self.raw {
            return raw.clone();
        }

        let mut line = String::new();
        line.push_str(&self.indent);
        if !self.enabled {
            line.push(DISABLE_MARKER);
        }
        let _ = write!(line, "{} = {}", self.key, self.value);
        if let Some(comment) = &self.comment {
            line.push(' ');
            line.push_str(comment);
        }
        line
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlistLine {
    Blank(String),
    Comment(String),
    Assignment(Assignment),
    /// Anything the line grammar does not recognize; kept verbatim.
    Other(String),
}

impl InlistLine {
    pub fn render(&self) -> String {
        match self {
            Self::Blank(raw) | Self::Comment(raw) | Self::Other(raw) => raw.clone(),
            Self::Assignment(assignment) => assignment.render(),
        }
    }

    pub fn as_assignment(&self) -> Option<&Assignment> {
        match self {
            Self::Assignment(assignment) => Some(assignment),
            _ => None,
        }
    }

    /// Comment text after the marker, trimmed and lowercased.
    fn comment_text(&self) -> Option<String> {
        match self {
            Self::Comment(raw) => Some(
                raw.trim()
                    .trim_start_matches(DISABLE_MARKER)
                    .trim()
                    .to_ascii_lowercase(),
            ),
            _ => None,
        }
    }
}

/// `&name ... /` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namelist {
    pub(super) name: String,
    pub(super) header: String,
    pub(super) lines: Vec<InlistLine>,
    pub(super) footer: String,
    /// Lines between this namelist's `/` and the next `&`.
    pub(super) trailing: Vec<InlistLine>,
}

impl Namelist {
    pub fn new(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        Self {
            header: format!("&{}", name),
            footer: format!("/ ! end of {} namelist", name),
            name,
            lines: Vec::new(),
            trailing: vec![InlistLine::Blank(String::new())],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lines(&self) -> &[InlistLine] {
        &self.lines
    }

    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.lines.iter().filter_map(InlistLine::as_assignment)
    }

    fn indent(&self) -> String {
        self.assignments()
            .find(|assignment| assignment.raw.is_some())
            .map(|assignment| assignment.indent.clone())
            .unwrap_or_else(|| DEFAULT_INDENT.to_string())
    }

    fn find_comment(&self, anchor: &str) -> Option<usize> {
        let anchor = anchor.to_ascii_lowercase();
        self.lines.iter().position(|line| {
            line.comment_text()
                .is_some_and(|text| text.starts_with(&anchor))
        })
    }

    /// Inserts after the anchor comment and any assignments already grouped under it.
    /// A missing anchor comment is created first, at the top or bottom of the block.
    fn insert_under_anchor(&mut self, anchor: &str, at_start: bool, mut assignment: Assignment) {
        let indent = self.indent();
        let anchor_index = match self.find_comment(anchor) {
            Some(index) => index,
            None if at_start => {
                self.lines
                    .insert(0, InlistLine::Comment(format!("{}! {}", indent, anchor)));
                0
            }
            None => {
                self.lines.push(InlistLine::Blank(String::new()));
                self.lines
                    .push(InlistLine::Comment(format!("{}! {}", indent, anchor)));
                self.lines.len() - 1
            }
        };

        let mut position = anchor_index + 1;
        while matches!(self.lines.get(position), Some(InlistLine::Assignment(_))) {
            position += 1;
        }
        assignment.indent = indent;
        self.lines.insert(position, InlistLine::Assignment(assignment));
    }

    fn append(&mut self, mut assignment: Assignment) {
        assignment.indent = self.indent();
        let position = self
            .lines
            .iter()
            .rposition(|line| !matches!(line, InlistLine::Blank(_)))
            .map_or(0, |index| index + 1);
        self.lines.insert(position, InlistLine::Assignment(assignment));
    }
}

/// Where a key goes when the document does not define it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub namelist: &'static str,
    pub anchor: Option<&'static str>,
    /// When the anchor comment is missing, create it at the top of the namelist instead of the bottom.
    pub anchor_at_start: bool,
}

impl Placement {
    pub const fn end_of(namelist: &'static str) -> Self {
        Self {
            namelist,
            anchor: None,
            anchor_at_start: false,
        }
    }

    pub const fn under(namelist: &'static str, anchor: &'static str, anchor_at_start: bool) -> Self {
        Self {
            namelist,
            anchor: Some(anchor),
            anchor_at_start,
        }
    }
}

/// Parsed inlist: ordered namelists of ordered lines, plus any text before the first one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Inlist {
    pub(super) leading: Vec<InlistLine>,
    pub(super) namelists: Vec<Namelist>,
    pub(super) trailing_newline: bool,
}

impl Inlist {
    pub fn namelists(&self) -> &[Namelist] {
        &self.namelists
    }

    pub fn namelist(&self, name: &str) -> Option<&Namelist> {
        self.namelists
            .iter()
            .find(|namelist| namelist.name.eq_ignore_ascii_case(name))
    }

    /// First active assignment of `key` in any namelist.
    pub fn get(&self, key: &str) -> Option<&Assignment> {
        let key = normalize_key(key);
        self.namelists
            .iter()
            .flat_map(Namelist::assignments)
            .find(|assignment| assignment.enabled && assignment.normalized_key() == key)
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).map(Assignment::value)
    }

    /// Every occurrence of `key`, active or disabled.
    pub fn occurrences(&self, key: &str) -> Vec<&Assignment> {
        let key = normalize_key(key);
        self.namelists
            .iter()
            .flat_map(Namelist::assignments)
            .filter(|assignment| assignment.normalized_key() == key)
            .collect()
    }

    /// Sets `key` to `value`, leaving exactly one active occurrence.
    ///
    /// An existing assignment (active first, otherwise disabled) is rewritten in
    /// place and further duplicates are disabled; without one, a new line is
    /// inserted according to `placement`.
    pub fn set(&mut self, key: &str, value: &str, placement: Placement) {
        let normalized = normalize_key(key);
        let mut positions = Vec::new();
        for (namelist_index, namelist) in self.namelists.iter().enumerate() {
            for (line_index, line) in namelist.lines.iter().enumerate() {
                if let InlistLine::Assignment(assignment) = line
                    && assignment.normalized_key() == normalized
                {
                    positions.push((namelist_index, line_index, assignment.enabled));
                }
            }
        }

        if positions.is_empty() {
            let assignment = Assignment::new(key, value);
            let namelist = self.ensure_namelist(placement.namelist);
            match placement.anchor {
                Some(anchor) => {
                    namelist.insert_under_anchor(anchor, placement.anchor_at_start, assignment)
                }
                None => namelist.append(assignment),
            }
            return;
        }

        let primary = positions
            .iter()
            .find(|(_, _, enabled)| *enabled)
            .copied()
            .unwrap_or(positions[0]);
        for (namelist_index, line_index, _) in positions {
            let InlistLine::Assignment(assignment) =
                &mut self.namelists[namelist_index].lines[line_index]
            else {
                continue;
            };
            if (namelist_index, line_index) == (primary.0, primary.1) {
                assignment.enable();
                assignment.set_value(value);
            } else {
                assignment.disable();
            }
        }
    }

    /// Disables every assignment whose key, ignoring any array index, is `base`.
    /// Returns how many lines changed state.
    pub fn disable_all(&mut self, base: &str) -> usize {
        let base = base.to_ascii_lowercase();
        let mut changed = 0;
        for namelist in &mut self.namelists {
            for line in &mut namelist.lines {
                if let InlistLine::Assignment(assignment) = line
                    && assignment.enabled
                    && assignment.base_name() == base
                {
                    assignment.disable();
                    changed += 1;
                }
            }
        }
        changed
    }

    pub fn ensure_namelist(&mut self, name: &str) -> &mut Namelist {
        let name = name.to_ascii_lowercase();
        if let Some(index) = self.namelists.iter().position(|namelist| namelist.name == name) {
            return &mut self.namelists[index];
        }

        let rank = namelist_rank(&name);
        let index = self
            .namelists
            .iter()
            .position(|namelist| namelist_rank(&namelist.name) > rank)
            .unwrap_or(self.namelists.len());
        self.namelists.insert(index, Namelist::new(&name));
        if self.namelists.len() == 1 && self.leading.is_empty() {
            self.trailing_newline = true;
        }
        &mut self.namelists[index]
    }

    pub fn render(&self) -> String {
        let mut lines: Vec<String> = self.leading.iter().map(InlistLine::render).collect();
        for namelist in &self.namelists {
            lines.push(namelist.header.clone());
            lines.extend(namelist.lines.iter().map(InlistLine::render));
            lines.push(namelist.footer.clone());
            lines.extend(namelist.trailing.iter().map(InlistLine::render));
        }

        let mut text = lines.join("\n");
        if self.trailing_newline {
            text.push('\n');
        }
        text
    }
}

pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|ch| !ch.is_whitespace())
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

pub fn base_name(key: &str) -> String {
    let normalized = normalize_key(key);
    match normalized.find('(') {
        Some(index) => normalized[..index].to_string(),
        None => normalized,
    }
}

fn namelist_rank(name: &str) -> usize {
    NAMELIST_ORDER
        .iter()
        .position(|candidate| *candidate == name)
        .unwrap_or(NAMELIST_ORDER.len())
}
