// src/export/questions.rs

//! `questions.xml`: every question category with its questions

use super::writer::XmlNode;
use crate::backup::EntityPool;
use crate::backup::entities::*;
use crate::error::{Error, Result};

pub fn questions_document(pool: &EntityPool) -> Result<XmlNode> {
    let mut root = XmlNode::new("question_categories");
    for category in pool.all::<QuestionCategoryEntity>() {
        let mut questions = XmlNode::new("questions");
        for id in &category.questions {
            let question = pool.get::<QuestionEntity>(*id).ok_or_else(|| unallocated("question", *id))?;
            questions = questions.child(question_node(pool, question)?);
        }

        root = root.child(
            XmlNode::new("question_category")
                .attr("id", category.id)
                .field("name", &category.name)
                .field("contextid", category.contextid)
                .field("contextlevel", category.contextlevel)
                .field("contextinstanceid", category.contextinstanceid)
                .field("info", &category.info)
                .field("infoformat", category.infoformat)
                .field("stamp", &category.stamp)
                .field("parent", category.parent)
                .field("sortorder", category.sortorder)
                .field("idnumber", NULL_MARKER)
                .child(questions),
        );
    }
    Ok(root)
}

fn question_node(pool: &EntityPool, question: &QuestionEntity) -> Result<XmlNode> {
    let length = match question.qtype {
        QuestionType::Description => 0,
        QuestionType::Multichoice => 1,
    };

    let mut node = XmlNode::new("question")
        .attr("id", question.id)
        .field("parent", question.parent)
        .field("name", &question.name)
        .field("questiontext", &question.questiontext)
        .field("questiontextformat", FORMAT_HTML)
        .field("generalfeedback", "")
        .field("generalfeedbackformat", FORMAT_HTML)
        .field("defaultmark", format!("{:.7}", question.defaultmark))
        .field("penalty", format!("{:.7}", question.penalty))
        .field("qtype", question.qtype.as_str())
        .field("length", length)
        .field("stamp", &question.stamp)
        .field("version", &question.version)
        .field("hidden", 0)
        .field("timecreated", question.timecreated)
        .field("timemodified", question.timemodified)
        .field("createdby", question.createdby)
        .field("modifiedby", question.modifiedby)
        .field("idnumber", NULL_MARKER);

    if question.qtype == QuestionType::Multichoice {
        node = node.child(multichoice_plugin(pool, question)?);
    }

    Ok(node
        .child(XmlNode::new("question_hints"))
        .child(XmlNode::new("tags")))
}

fn multichoice_plugin(pool: &EntityPool, question: &QuestionEntity) -> Result<XmlNode> {
    let mut answers = XmlNode::new("answers");
    for id in &question.answers {
        let answer = pool.get::<AnswerEntity>(*id).ok_or_else(|| unallocated("answer", *id))?;
        answers = answers.child(
            XmlNode::new("answer")
                .attr("id", answer.id)
                .field("answertext", &answer.answertext)
                .field("answerformat", FORMAT_HTML)
                .field("fraction", format!("{:.7}", answer.fraction))
                .field("feedback", &answer.feedback)
                .field("feedbackformat", FORMAT_HTML),
        );
    }

    let mut plugin = XmlNode::new("plugin_qtype_multichoice_question").child(answers);
    if let Some(options_id) = question.multichoice {
        let options = pool
            .get::<MultichoiceEntity>(options_id)
            .ok_or_else(|| unallocated("question_multichoice", options_id))?;
        plugin = plugin.child(
            XmlNode::new("multichoice")
                .attr("id", options.id)
                .field("layout", options.layout)
                .field("single", options.single)
                .field("shuffleanswers", options.shuffleanswers)
                .field("correctfeedback", &options.correctfeedback)
                .field("correctfeedbackformat", FORMAT_HTML)
                .field("partiallycorrectfeedback", &options.partiallycorrectfeedback)
                .field("partiallycorrectfeedbackformat", FORMAT_HTML)
                .field("incorrectfeedback", &options.incorrectfeedback)
                .field("incorrectfeedbackformat", FORMAT_HTML)
                .field("answernumbering", &options.answernumbering)
                .field("shownumcorrect", options.shownumcorrect)
                .field("showstandardinstruction", 1),
        );
    }
    Ok(plugin)
}

fn unallocated(entity_type: &str, id: u32) -> Error {
    Error::UnallocatedEntity {
        entity_type: entity_type.to_string(),
        id,
    }
}
