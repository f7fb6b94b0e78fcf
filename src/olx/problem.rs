// src/olx/problem.rs

//! Problem documents
//!
//! The root element's direct children split into three groups: `<solution>`
//! blocks, recognised response types (parsed into `Question`s), and
//! everything else, kept as instruction markup.

use super::model::{Choice, Problem, Question};
use super::xml::{Attrs, Child, Element, XmlStream};
use crate::error::{Error, Result};
use std::path::Path;

/// Element names that hold a gradable question
const QUESTION_TAGS: [&str; 2] = ["multiplechoiceresponse", "choiceresponse"];

pub(crate) fn parse_problem(stream: &mut XmlStream, attrs: &Attrs, empty: bool) -> Result<Problem> {
    let path = stream.path().to_path_buf();
    let mut problem = Problem {
        display_name: attrs.string("display_name"),
        max_attempts: parse_number(attrs.get("max_attempts"), &path, "max_attempts")?,
        show_answer: attrs
            .get("showanswer")
            .or_else(|| attrs.get("show_answers"))
            .unwrap_or_default()
            .to_string(),
        weight: parse_number(attrs.get("weight"), &path, "weight")?,
        rerandomize: is_rerandomized(attrs.get("rerandomize")),
        instructions: Vec::new(),
        solutions: Vec::new(),
        questions: Vec::new(),
    };
    if empty {
        return Ok(problem);
    }

    while let Some(child) = stream.next_child()? {
        let Child::Element { start, empty } = child else {
            continue;
        };
        let element = Element::read(stream, start, empty)?;

        if element.name == "solution" {
            problem.solutions.push(element.inner_xml());
        } else if QUESTION_TAGS.contains(&element.name.as_str()) {
            problem.questions.push(parse_question(&element, &path)?);
        } else {
            problem.instructions.push(element.outer_xml());
        }
    }

    Ok(problem)
}

fn parse_question(element: &Element, path: &Path) -> Result<Question> {
    match element.name.as_str() {
        "multiplechoiceresponse" => {
            let group = find_group(element, "choicegroup", path)?;
            Ok(Question::MultipleChoice {
                label: question_label(element, group),
                kind: group.attr("type").unwrap_or_default().to_string(),
                choices: parse_choices(group, path)?,
            })
        }
        "choiceresponse" => {
            let group = find_group(element, "checkboxgroup", path)?;
            Ok(Question::Checkbox {
                label: question_label(element, group),
                direction: group.attr("direction").unwrap_or("vertical").to_string(),
                choices: parse_choices(group, path)?,
            })
        }
        other => Err(Error::parse(path, format!("<{}> is not a question type", other))),
    }
}

fn find_group<'a>(element: &'a Element, name: &str, path: &Path) -> Result<&'a Element> {
    element
        .find(name)
        .ok_or_else(|| Error::parse(path, format!("<{}> without <{}>", element.name, name)))
}

/// Label attribute of the group, or the newer `<label>` sibling element
fn question_label(response: &Element, group: &Element) -> String {
    if let Some(label) = group.attr("label") {
        return label.to_string();
    }
    response
        .find("label")
        .map(|label| label.text_excluding(&[]).trim().to_string())
        .unwrap_or_default()
}

fn parse_choices(group: &Element, path: &Path) -> Result<Vec<Choice>> {
    group
        .elements()
        .filter(|e| e.name == "choice")
        .map(|choice| {
            let correct = choice.attr("correct").ok_or_else(|| {
                Error::parse(path, "<choice> without a correct attribute")
            })?;
            Ok(Choice {
                correct: correct.trim().eq_ignore_ascii_case("true"),
                text: choice.text_excluding(&["choicehint"]).trim().to_string(),
            })
        })
        .collect()
}

fn is_rerandomize_value(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "always" | "onreset" | "per_student" | "true" | "1"
    )
}

fn is_rerandomized(value: Option<&str>) -> bool {
    value.is_some_and(is_rerandomize_value)
}

fn parse_number<T: std::str::FromStr>(value: Option<&str>, path: &Path, name: &str) -> Result<Option<T>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| Error::parse(path, format!("{} is not a number: {:?}", name, v))),
    }
}
