//! Markdown rendering of an aligned resume (the copy / download format).

use crate::alignment::models::AlignedResume;

/// Renders the resume as Markdown. `[INFERRED]` / `[ENHANCED]` markers are kept verbatim.
pub fn to_markdown(resume: &AlignedResume) -> String {
    let experience = resume
        .experience
        .iter()
        .map(|bullet| format!("- {bullet}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "# {}\n{}\n\n## Professional Summary\n{}\n\n## Experience\n{}\n\n## Education\n{}",
        resume.name, resume.title, resume.summary, experience, resume.education
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_layout() {
        let resume = AlignedResume {
            name: "Jane Doe".to_string(),
            title: "Backend Engineer".to_string(),
            summary: "Python and Go [INFERRED]".to_string(),
            experience: vec![
                "Built billing service [ENHANCED]".to_string(),
                "Mentored two engineers".to_string(),
            ],
            education: "BSc, State University".to_string(),
        };

        let expected = "# Jane Doe\nBackend Engineer\n\n\
            ## Professional Summary\nPython and Go [INFERRED]\n\n\
            ## Experience\n- Built billing service [ENHANCED]\n- Mentored two engineers\n\n\
            ## Education\nBSc, State University";
        assert_eq!(to_markdown(&resume), expected);
    }

    #[test]
    fn test_empty_experience_leaves_section_blank() {
        let resume = AlignedResume {
            name: "A".to_string(),
            title: "B".to_string(),
            summary: "C".to_string(),
            experience: vec![],
            education: "D".to_string(),
        };
        assert!(to_markdown(&resume).contains("## Experience\n\n\n## Education\nD"));
    }
}
