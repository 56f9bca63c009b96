//! Example prompt library, grouped by platform.

use serde::Serialize;

use crate::platform::Platform;

/// An example prompt that can be loaded into the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PromptTemplate {
    pub title: &'static str,
    pub body: &'static str,
}

const CLAUDE_TEMPLATES: &[PromptTemplate] = &[
    PromptTemplate {
        title: "Structured analysis with XML tags",
        body: r#"Context: I'm preparing a quarterly review for a small engineering team.

Analyze the report inside <report> tags and write a summary for the team lead.

<report>
{{paste report here}}
</report>

Format the answer as:
<summary>three sentences</summary>
<risks>a bulleted list, most severe first</risks>

Be specific: quote the numbers you rely on."#,
    },
    PromptTemplate {
        title: "Role + constraints",
        body: r#"You are a senior technical editor.

Background: the text below is a draft blog post for developers who are new to Rust.

Rewrite it so each paragraph has one idea. Keep the author's voice. Avoid adding new claims.
Length must stay within 10% of the original."#,
    },
    PromptTemplate {
        title: "Step-by-step reasoning",
        body: r#"Scenario: a customer reports that invoices are sometimes emailed twice.

Think through the likely causes step by step before answering, then write
a short list of exactly three checks the support team should do first.
For example: "Check whether the retry queue re-sent the job.""#,
    },
];

const GEMINI_TEMPLATES: &[PromptTemplate] = &[
    PromptTemplate {
        title: "Multimodal description",
        body: r#"Context: the attached image is a product photo for an online store.

Write a product description of 80-100 words. The style should be warm and concrete.
Mention the exact colors you can see. Don't guess at materials that aren't visible."#,
    },
    PromptTemplate {
        title: "Comparison table",
        body: r#"Background: I'm choosing a database for a side project with about 10k users.

Create a comparison table of PostgreSQL, SQLite, and MongoDB with the columns
setup effort, hosting cost, and scaling limits. Be precise and cite typical limits,
such as maximum practical database size."#,
    },
];

const GPT_TEMPLATES: &[PromptTemplate] = &[
    PromptTemplate {
        title: "Few-shot classification",
        body: r#"Classify each support ticket as billing, bug, or feature-request.

Example:
Ticket: "I was charged twice this month." -> billing
Ticket: "The export button does nothing." -> bug

Now do the same for the tickets below, one label per line, in the same format."#,
    },
    PromptTemplate {
        title: "Persona and audience",
        body: r#"You are a patient math tutor.

Situation: a 12-year-old student is stuck on fractions and feels discouraged.

Write an explanation of adding fractions with different denominators.
Use one concrete example like pizza slices. Keep it under 150 words and
avoid technical vocabulary."#,
    },
    PromptTemplate {
        title: "Detailed code review",
        body: r#"Context: this function runs in a web request handler and is called ~50 times per second.

Analyze the code below for correctness and performance. For each problem,
give the line, a specific explanation, and a corrected snippet.

```
{{paste code here}}
```"#,
    },
];

/// Templates for the given platform, in display order.
pub fn for_platform(platform: Platform) -> &'static [PromptTemplate] {
    match platform {
        Platform::Claude => CLAUDE_TEMPLATES,
        Platform::Gemini => GEMINI_TEMPLATES,
        Platform::Gpt => GPT_TEMPLATES,
    }
}
