// src/backup/builder/quiz.rs

//! Quizzes, their question bank and grade item
//!
//! Each quiz owns a two-level question category pair (`top` and its
//! default child) in the module context. Static items become description
//! questions; problems become multichoice questions built from their first
//! question only.

use super::{Builder, SectionSlot};
use crate::backup::content::rewrite_static_refs;
use crate::backup::context::{CONTEXT_LEVEL_MODULE, module_context};
use crate::backup::entities::*;
use crate::backup::files::FileArea;
use crate::backup::refs::RefKind;
use crate::error::Result;
use crate::olx::{NodeData, NodeId, Problem, SourceNode};
use tracing::{debug, warn};

const DEFAULT_MARK: f64 = 1.0;
const DEFAULT_PENALTY: f64 = 0.3333333;

const CORRECT_FEEDBACK: &str = "Your answer is correct.";
const PARTIALLY_CORRECT_FEEDBACK: &str = "Your answer is partially correct.";
const INCORRECT_FEEDBACK: &str = "Your answer is incorrect.";

impl Builder<'_> {
    pub(super) fn build_quiz(&mut self, items: &[NodeId], title: &str, section: SectionSlot) -> Result<()> {
        let tree = self.tree;
        let questions: Vec<&SourceNode> = items
            .iter()
            .map(|id| tree.node(*id))
            .filter(|node| {
                let keep = matches!(node.data, NodeData::Problem(_)) || node.kind().is_static();
                if !keep {
                    warn!("{} {} cannot be a quiz question, dropping it", node.kind(), node.url_name);
                }
                keep
            })
            .collect();

        let activity = self.new_module(ModuleKind::Quiz, title, section)?;
        let quiz_id = self.model.pool.new_entity(EntityType::Quiz);
        let contextid = module_context(activity.moduleid);

        let top_id = self.new_top_category(activity.moduleid)?;
        let category_id = self.model.pool.new_entity(EntityType::QuestionCategory);

        let mut question_ids = Vec::with_capacity(questions.len());
        let mut instance_ids = Vec::with_capacity(questions.len());
        for (index, node) in questions.into_iter().enumerate() {
            let (question_id, maxmark) = self.build_question(node, contextid)?;
            question_ids.push(question_id);

            let instance_id = self.model.pool.new_entity(EntityType::QuestionInstance);
            self.model.pool.set(
                instance_id,
                QuestionInstanceEntity {
                    id: instance_id,
                    slot: index as u32 + 1,
                    page: 1,
                    questionid: question_id,
                    questioncategoryid: category_id,
                    maxmark,
                },
            )?;
            instance_ids.push(instance_id);
        }

        let category = QuestionCategoryEntity {
            id: category_id,
            name: format!("Default for {}", title),
            info: format!("The default category for questions shared in context {}", title),
            infoformat: FORMAT_HTML,
            contextid,
            contextlevel: CONTEXT_LEVEL_MODULE,
            contextinstanceid: activity.moduleid,
            stamp: self.stamp(),
            parent: top_id,
            sortorder: 0,
            questions: question_ids,
        };
        self.model.pool.set(category_id, category)?;

        self.model.pool.set(
            quiz_id,
            QuizEntity {
                id: quiz_id,
                moduleid: activity.moduleid,
                contextid,
                name: title.to_string(),
                intro: String::new(),
                question_instances: instance_ids,
                timecreated: self.now,
                timemodified: self.now,
            },
        )?;

        let owner = ModuleKind::Quiz.component();
        self.model.refs.add(owner, quiz_id, RefKind::QuestionCategory, category_id);
        self.model.refs.add(owner, quiz_id, RefKind::QuestionCategory, top_id);

        let grade_item = self.new_grade_item(title, ModuleKind::Quiz, quiz_id)?;
        self.model.refs.add(owner, quiz_id, RefKind::GradeItem, grade_item);

        self.associate(activity, quiz_id)
    }

    fn new_top_category(&mut self, moduleid: u32) -> Result<u32> {
        let id = self.model.pool.new_entity(EntityType::QuestionCategory);
        let category = QuestionCategoryEntity {
            id,
            name: "top".to_string(),
            info: String::new(),
            infoformat: FORMAT_MOODLE,
            contextid: module_context(moduleid),
            contextlevel: CONTEXT_LEVEL_MODULE,
            contextinstanceid: moduleid,
            stamp: self.stamp(),
            parent: 0,
            sortorder: 0,
            questions: Vec::new(),
        };
        self.model.pool.set(id, category)?;
        Ok(id)
    }

    /// Returns the question id and the mark it carries in its quiz slot
    fn build_question(&mut self, node: &SourceNode, contextid: u32) -> Result<(u32, f64)> {
        let id = self.model.pool.new_entity(EntityType::Question);
        let raw = node.data.content().unwrap_or_default();

        let mut question = QuestionEntity {
            id,
            parent: 0,
            name: node.display_name().to_string(),
            questiontext: rewrite_static_refs(&raw),
            qtype: QuestionType::Description,
            defaultmark: DEFAULT_MARK,
            penalty: DEFAULT_PENALTY,
            maxmark: 0.0,
            stamp: self.stamp(),
            version: self.stamp(),
            createdby: ADMIN_USER_ID,
            modifiedby: ADMIN_USER_ID,
            answers: Vec::new(),
            multichoice: None,
            timecreated: self.now,
            timemodified: self.now,
        };

        if let NodeData::Problem(problem) = &node.data {
            if problem.questions.len() > 1 {
                debug!(
                    "Problem {} has {} questions, converting the first only",
                    node.url_name,
                    problem.questions.len()
                );
            }
            if problem.questions.is_empty() {
                warn!("Problem {} has no supported question, keeping it as a description", node.url_name);
            } else {
                question.qtype = QuestionType::Multichoice;
                question.maxmark = DEFAULT_MARK;
                question.answers = self.build_answers(problem, id, contextid)?;
                question.multichoice = Some(self.build_multichoice(problem)?);
            }
        }

        let maxmark = question.maxmark;
        self.model.pool.set(id, question)?;
        self.collect_files(
            FileArea {
                owner_type: "question",
                owner_id: id,
                component: "question",
                filearea: "questiontext",
                itemid: id,
                contextid,
            },
            &raw,
        )?;
        Ok((id, maxmark))
    }

    fn build_answers(&mut self, problem: &Problem, question_id: u32, contextid: u32) -> Result<Vec<u32>> {
        let Some(first) = problem.questions.first() else {
            return Ok(Vec::new());
        };

        let mut ids = Vec::with_capacity(first.choices().len());
        for choice in first.choices() {
            let id = self.model.pool.new_entity(EntityType::Answer);
            self.model.pool.set(
                id,
                AnswerEntity {
                    id,
                    answertext: rewrite_static_refs(&choice.text),
                    fraction: if choice.correct { 1.0 } else { 0.0 },
                    feedback: String::new(),
                },
            )?;
            self.collect_files(
                FileArea {
                    owner_type: "question",
                    owner_id: question_id,
                    component: "question",
                    filearea: "answer",
                    itemid: id,
                    contextid,
                },
                &choice.text,
            )?;
            ids.push(id);
        }
        Ok(ids)
    }

    fn build_multichoice(&mut self, problem: &Problem) -> Result<u32> {
        let id = self.model.pool.new_entity(EntityType::QuestionMultichoice);
        self.model.pool.set(
            id,
            MultichoiceEntity {
                id,
                layout: 0,
                single: 1,
                shuffleanswers: u8::from(problem.rerandomize),
                correctfeedback: CORRECT_FEEDBACK.to_string(),
                partiallycorrectfeedback: PARTIALLY_CORRECT_FEEDBACK.to_string(),
                incorrectfeedback: INCORRECT_FEEDBACK.to_string(),
                answernumbering: "abc".to_string(),
                shownumcorrect: 1,
            },
        )?;
        Ok(id)
    }

    /// Module grade item in the course grade category
    fn new_grade_item(&mut self, name: &str, module: ModuleKind, instance: u32) -> Result<u32> {
        let id = self.model.pool.new_entity(EntityType::GradeItem);
        self.model.pool.set(
            id,
            GradeItemEntity {
                id,
                categoryid: self.grade_category,
                itemname: name.to_string(),
                itemtype: "mod".to_string(),
                itemmodule: Some(module),
                iteminstance: instance,
                grademax: 100.0,
                grademin: 0.0,
                sortorder: id,
                timecreated: self.now,
                timemodified: self.now,
            },
        )?;
        Ok(id)
    }
}
