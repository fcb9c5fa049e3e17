// ABOUTME: The fixed, compiled-in slide deck
// ABOUTME: Slides are opaque markdown units addressed by their position in presentation order

use crate::errors::{DeckError, Result};

/// One unit of presentation content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slide {
    pub label: &'static str,
    pub markdown: &'static str,
}

/// Text that a copy button places on the clipboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snippet {
    pub key: &'static str,
    pub text: &'static str,
}

/// An ordered, immutable list of slides plus the snippets they reference
#[derive(Debug, Clone, Copy)]
pub struct SlideDeck {
    pub title: &'static str,
    slides: &'static [Slide],
    snippets: &'static [Snippet],
    /// Snippet shown in the modal dialog
    pub modal: Option<&'static str>,
}

impl SlideDeck {
    pub fn new(
        title: &'static str,
        slides: &'static [Slide],
        snippets: &'static [Snippet],
    ) -> Result<Self> {
        if slides.is_empty() {
            return Err(DeckError::ValidationError(
                "A deck needs at least one slide".to_string(),
            ));
        }
        Ok(Self {
            title,
            slides,
            snippets,
            modal: None,
        })
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    pub fn slides(&self) -> &[Slide] {
        self.slides
    }

    pub fn snippet(&self, key: &str) -> Option<&'static str> {
        self.snippets.iter().find(|s| s.key == key).map(|s| s.text)
    }

    pub fn modal_text(&self) -> Option<&'static str> {
        self.modal.and_then(|key| self.snippet(key))
    }
}

const LETTER: &str = include_str!("../content/letter.txt");

const PROMPT_ROLE_FIT: &str = "You are my job-search copilot. I'll paste my CV and a job description. \
Identify my top strengths against the description, the risks and gaps, and rewrite 3 bullets from my CV \
that better match the role without exaggeration. Output: strengths, risks, 3 rewritten bullets.";

const PROMPT_RESEARCH: &str = "You are my research analyst. I'll upload an annual report, recent press, \
and product pages. Produce 6 targeted interview questions for ROLE, each tied to a specific passage, \
plus a one-paragraph insight summary.";

const PROMPT_INTERVIEW: &str = "Act as an interviewer for ROLE. Use my CV and the interviewer's public \
profile. Ask 8 questions, one at a time, with follow-ups. After each answer, give brief coaching to \
tighten the STAR structure.";

static SLIDES: &[Slide] = &[
    Slide {
        label: "Opening",
        markdown: include_str!("../content/01-opening.md"),
    },
    Slide {
        label: "Core Idea: The New Shovels",
        markdown: include_str!("../content/02-new-shovels.md"),
    },
    Slide {
        label: "Innovation Swimlanes",
        markdown: include_str!("../content/03-swimlanes.md"),
    },
    Slide {
        label: "The Branching Timeline",
        markdown: include_str!("../content/04-timeline.md"),
    },
    Slide {
        label: "The Digital Workforce",
        markdown: include_str!("../content/05-digital-workforce.md"),
    },
    Slide {
        label: "My Professional Story",
        markdown: include_str!("../content/06-story.md"),
    },
    Slide {
        label: "Actionable Strategies",
        markdown: include_str!("../content/07-strategies.md"),
    },
    Slide {
        label: "Exhibit: Full Letter",
        markdown: include_str!("../content/08-letter.md"),
    },
    Slide {
        label: "Apply the Pattern",
        markdown: include_str!("../content/09-apply.md"),
    },
    Slide {
        label: "Overview & Call to Action",
        markdown: include_str!("../content/10-call-to-action.md"),
    },
    Slide {
        label: "Conclusion",
        markdown: include_str!("../content/11-conclusion.md"),
    },
];

static SNIPPETS: &[Snippet] = &[
    Snippet {
        key: "letter",
        text: LETTER,
    },
    Snippet {
        key: "modalLetter",
        text: LETTER,
    },
    Snippet {
        key: "chatgpt",
        text: PROMPT_ROLE_FIT,
    },
    Snippet {
        key: "gemini",
        text: PROMPT_RESEARCH,
    },
    Snippet {
        key: "copilot",
        text: PROMPT_INTERVIEW,
    },
];

/// The deck shipped with the binary
pub fn builtin() -> SlideDeck {
    SlideDeck {
        title: "1% Better Series",
        slides: SLIDES,
        snippets: SNIPPETS,
        modal: Some("letter"),
    }
}
