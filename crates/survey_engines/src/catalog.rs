#![forbid(unsafe_code)]

//! Static CRediT reference data: the 14 contributor roles, their long-form
//! definitions for the education cards, and the matching icon set.

use rand::seq::SliceRandom;
use rand::Rng;
use survey_kernel_contracts::icon::{IconItem, IconShape};
use survey_kernel_contracts::role::{CreditRole, RoleId};

const ROLE_ROWS: [(u8, &str, &str); 14] = [
    (1, "Conceptualization", "Ideas; formulation or evolution of overarching research goals and aims."),
    (2, "Data Curation", "Management activities to annotate, scrub, and maintain research data."),
    (3, "Formal Analysis", "Application of statistical, mathematical, or other formal techniques to analyze or synthesize study data."),
    (4, "Funding Acquisition", "Acquisition of financial support for the project."),
    (5, "Investigation", "Conducting the research and investigation process, performing experiments, or collecting data."),
    (6, "Methodology", "Development or design of methodology; creation of models."),
    (7, "Project Administration", "Management and coordination of the research activity planning and execution."),
    (8, "Resources", "Provision of study materials, reagents, patients, lab samples, instrumentation, or other analysis tools."),
    (9, "Software", "Programming, software development, designing computer programs, and testing code."),
    (10, "Supervision", "Oversight and leadership for the research activity, including mentorship."),
    (11, "Validation", "Verification and reproducibility of results, experiments, and other research outputs."),
    (12, "Visualization", "Preparation, creation, and presentation of the work, specifically visualization and data presentation."),
    (13, "Writing \u{2013} Original Draft", "Writing the initial draft of the published work."),
    (14, "Writing \u{2013} Review & Editing", "Critical review, commentary, or revision of the work."),
];

const DEFINITION_ROWS: [&str; 14] = [
    "Ideas; formulation or evolution of overarching research goals and aims. This includes developing the initial research question, hypothesis, or theoretical framework that guides the entire study.",
    "Management activities to annotate (metadata), scrub data and maintain research data (including software code, where it is necessary for interpreting the data itself) for initial use and later re-use. This includes organizing, cleaning, and preserving data for long-term accessibility.",
    "Application of statistical, mathematical, computational, or other formal techniques to analyze or synthesize study data. This includes running statistical tests, creating models, and interpreting quantitative or qualitative results.",
    "Acquisition of the financial support for the project leading to this publication. This includes writing grant proposals, securing research funding, and managing financial resources for the research project.",
    "Conducting a research and investigation process, specifically performing the experiments, or data/evidence collection. This is the hands-on work of gathering information, running experiments, and collecting observations.",
    "Development or design of methodology; creation of models. This includes designing the research approach, selecting appropriate methods, and developing protocols or procedures for data collection and analysis.",
    "Management and coordination responsibility for the research activity planning and execution. This includes overseeing timelines, coordinating team members, and ensuring project milestones are met.",
    "Provision of study materials, reagents, materials, patients, laboratory samples, animals, instrumentation, computing resources, or other analysis tools. This includes providing access to necessary equipment, facilities, or materials.",
    "Programming, software development; designing computer programs; implementation of the computer code and supporting algorithms; testing of existing code components. This includes creating tools, scripts, and applications used in the research.",
    "Oversight and leadership responsibility for the research activity planning and execution, including mentorship external to the core team. This includes guiding junior researchers, providing scientific direction, and ensuring quality standards.",
    "Verification, whether as a part of the activity or separate, of the overall replication/reproducibility of results/experiments and other research outputs. This includes confirming that results can be reproduced and are scientifically sound.",
    "Preparation, creation and/or presentation of the published work, specifically visualization/data presentation. This includes creating figures, charts, graphs, and other visual representations of data and results.",
    "Preparation, creation and/or presentation of the published work, specifically writing the initial draft (including substantive translation). This includes creating the first version of manuscripts, reports, or other written outputs.",
    "Preparation, creation and/or presentation of the published work by those from the original research group, specifically critical review, commentary or revision \u{2013} including pre- or post-publication stages. This includes revising, editing, and improving written work.",
];

const ICON_ROWS: [(&str, &str, &str, IconShape); 14] = [
    ("conceptualization", "Conceptualization", "#3B82F6", IconShape::Lightbulb),
    ("data-curation", "Data Curation", "#10B981", IconShape::Database),
    ("formal-analysis", "Formal Analysis", "#8B5CF6", IconShape::MagnifyingGlass),
    ("funding-acquisition", "Funding Acquisition", "#F59E0B", IconShape::Coin),
    ("investigation", "Investigation", "#EF4444", IconShape::Microscope),
    ("methodology", "Methodology", "#06B6D4", IconShape::Workflow),
    ("project-administration", "Project Administration", "#84CC16", IconShape::Person),
    ("resources", "Resources", "#F97316", IconShape::Box),
    ("software", "Software", "#6366F1", IconShape::Code),
    ("supervision", "Supervision", "#EC4899", IconShape::OrgChart),
    ("validation", "Validation", "#14B8A6", IconShape::Clipboard),
    ("visualization", "Visualization", "#A855F7", IconShape::Chart),
    ("writing-original", "Writing \u{2013} Original Draft", "#DC2626", IconShape::Pen),
    ("writing-review", "Writing \u{2013} Review & Editing", "#7C2D12", IconShape::PenCaret),
];

/// Choices offered on the intake form; `"Other"` switches to free text.
pub const SCIENTIFIC_FIELDS: [&str; 14] = [
    "Biology",
    "Chemistry",
    "Physics",
    "Biochemistry",
    "Medical/Medicine",
    "Psychology",
    "Environmental Science",
    "Computer Science",
    "Mathematics",
    "Engineering",
    "Neuroscience",
    "Genetics",
    "Pharmacology",
    FIELD_OTHER,
];

pub const FIELD_OTHER: &str = "Other";

pub fn credit_roles() -> Vec<CreditRole> {
    ROLE_ROWS
        .iter()
        .map(|(id, title, description)| CreditRole::unassigned(RoleId(*id), title, description))
        .collect()
}

/// Same roles with the long-form definitions shown on the education cards.
pub fn credit_definitions() -> Vec<CreditRole> {
    ROLE_ROWS
        .iter()
        .zip(DEFINITION_ROWS.iter())
        .map(|((id, title, _), definition)| CreditRole::unassigned(RoleId(*id), title, definition))
        .collect()
}

pub fn icon_set() -> Vec<IconItem> {
    ICON_ROWS
        .iter()
        .map(|(id, name, color, shape)| IconItem::new(id, name, color, *shape))
        .collect()
}

pub fn shuffled_icon_set<R: Rng + ?Sized>(rng: &mut R) -> Vec<IconItem> {
    let mut icons = icon_set();
    icons.shuffle(rng);
    icons
}
