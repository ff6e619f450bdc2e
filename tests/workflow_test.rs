mod common;

use std::sync::Arc;

use common::{invoker, ScriptedGenerator, ESSAY};
use essay_tutor::error::WorkflowError;
use essay_tutor::models::{
    ErrorCategory, KnowledgeSnippet, ProficiencyLevel, RemediationState, RubricDimension, Stage,
    Verdict,
};
use essay_tutor::services::SnippetKnowledge;
use essay_tutor::workflow::{RemediationFlow, StepReport};

const GROUPED: &str = "Crase: \"a escola\" sem acento grave\nConcordância: \"jovens vai\"";
const EXERCISE: &str = "Exercício: Corrija a frase \"Vou a escola\".\nResposta correta: Vou à escola.";

fn flow(generator: &Arc<ScriptedGenerator>, max_attempts: u32) -> RemediationFlow {
    RemediationFlow::new(invoker(generator.clone(), max_attempts))
}

/// 推进到第一道练习
async fn state_with_first_exercise(
    generator: &Arc<ScriptedGenerator>,
    flow: &RemediationFlow,
) -> RemediationState {
    for reply in ["Visão geral", "Erros encontrados", GROUPED, "Teoria da crase", EXERCISE] {
        generator.push(reply);
    }

    let mut state = RemediationState::new(RubricDimension::NormMastery);
    for _ in 0..3 {
        flow.advance(&mut state, ESSAY).await.unwrap();
    }
    state
}

#[tokio::test]
async fn test_stages_up_to_first_exercise() {
    let generator = ScriptedGenerator::new(vec![
        Ok("Visão geral"),
        Ok("Erros encontrados"),
        Ok(GROUPED),
        Ok("Teoria da crase"),
        Ok(EXERCISE),
    ]);
    let flow = flow(&generator, 1);
    let mut state = RemediationState::new(RubricDimension::NormMastery);

    let overview = flow.advance(&mut state, ESSAY).await.unwrap();
    assert_eq!(
        overview,
        StepReport::Overview {
            competency: RubricDimension::NormMastery,
            text: "Visão geral".to_string(),
        }
    );
    assert_eq!(state.stage(), Stage::ErrorIdentification);

    let identified = flow.advance(&mut state, ESSAY).await.unwrap();
    assert_eq!(
        identified,
        StepReport::ErrorsIdentified {
            categories: vec![
                ErrorCategory::new("Crase", "\"a escola\" sem acento grave"),
                ErrorCategory::new("Concordância", "\"jovens vai\""),
            ],
        }
    );
    assert_eq!(state.stage(), Stage::PerCategoryCorrection);
    assert_eq!((state.category_index(), state.level()), (0, ProficiencyLevel::Basic));

    let exercise = flow.advance(&mut state, ESSAY).await.unwrap();
    match exercise {
        StepReport::Exercise {
            category,
            level,
            theory,
            exercise,
            ..
        } => {
            assert_eq!(category.label, "Crase");
            assert_eq!(level, ProficiencyLevel::Basic);
            assert_eq!(theory, "Teoria da crase");
            assert_eq!(exercise, "Corrija a frase \"Vou a escola\".");
        }
        other => panic!("esperava exercício, veio {:?}", other),
    }
    assert_eq!(
        state.pending().map(|p| p.answer.as_str()),
        Some("Vou à escola.")
    );

    // 错误扫描提示词包含作文原文
    assert!(generator.prompts()[1].contains(ESSAY));
}

#[tokio::test]
async fn test_incorrect_answer_keeps_position_and_surfaces_feedback() {
    let generator = ScriptedGenerator::new(vec![]);
    let flow = flow(&generator, 1);
    let mut state = state_with_first_exercise(&generator, &flow).await;

    generator.push("Correto: Não\nFeedback: falta conectivo.");
    let evaluation = flow.submit_answer(&mut state, "Vou a escola").await.unwrap();

    assert_eq!(evaluation.verdict, Verdict::Incorrect);
    assert_eq!(evaluation.feedback, "falta conectivo.");
    assert_eq!((state.category_index(), state.level()), (0, ProficiencyLevel::Basic));
    assert_eq!(state.attempts_at_level(), 1);

    // 同一道练习重新展示，不再调用生成服务
    let calls = generator.calls();
    let again = flow.advance(&mut state, ESSAY).await.unwrap();
    assert!(matches!(again, StepReport::Exercise { level: ProficiencyLevel::Basic, .. }));
    assert_eq!(generator.calls(), calls);
}

#[tokio::test]
async fn test_echoed_correct_answer_does_not_advance_level() {
    let generator = ScriptedGenerator::new(vec![]);
    let flow = flow(&generator, 1);
    let mut state = state_with_first_exercise(&generator, &flow).await;

    generator.push("Resposta correta: Sim\nCorreto: Não\nFeedback: errou.");
    let evaluation = flow.submit_answer(&mut state, "Não").await.unwrap();

    assert_eq!(evaluation.verdict, Verdict::Incorrect);
    assert_eq!((state.category_index(), state.level()), (0, ProficiencyLevel::Basic));
    assert!(state.pending().is_some());
}

#[tokio::test]
async fn test_unevaluable_reply_does_not_advance() {
    let generator = ScriptedGenerator::new(vec![]);
    let flow = flow(&generator, 1);
    let mut state = state_with_first_exercise(&generator, &flow).await;

    generator.push("Hmm, difícil dizer.");
    let evaluation = flow.submit_answer(&mut state, "Vou à escola").await.unwrap();

    assert_eq!(evaluation.verdict, Verdict::CouldNotEvaluate);
    assert_eq!((state.category_index(), state.level()), (0, ProficiencyLevel::Basic));
    assert!(state.pending().is_some());
}

#[tokio::test]
async fn test_level_and_index_never_decrease() {
    let generator = ScriptedGenerator::new(vec![]);
    let flow = flow(&generator, 1);
    let mut state = state_with_first_exercise(&generator, &flow).await;

    let verdicts = [
        "Correto: Sim", "Correto: Não", "Correto: Sim", "Correto: Sim",
        "Correto: Sim", "Correto: Não", "Correto: Sim", "Correto: Sim",
    ];
    let mut previous = (state.category_index(), state.level());

    for verdict in verdicts {
        if state.stage() == Stage::FinalAnalysis {
            break;
        }
        if state.pending().is_none() {
            generator.push("Teoria");
            generator.push(EXERCISE);
            flow.advance(&mut state, ESSAY).await.unwrap();
        }
        generator.push(verdict);
        flow.submit_answer(&mut state, "resposta").await.unwrap();

        let current = (state.category_index(), state.level());
        assert!(current.0 >= previous.0, "índice regrediu: {:?} → {:?}", previous, current);
        if current.0 == previous.0 {
            assert!(current.1 >= previous.1, "nível regrediu: {:?} → {:?}", previous, current);
        } else {
            assert_eq!(current.1, ProficiencyLevel::Basic);
        }
        previous = current;
    }

    // 6 次正确：两个类别各 3 个等级
    assert_eq!(state.stage(), Stage::FinalAnalysis);
    assert_eq!(state.category_index(), state.categories().len());
    assert_eq!(state.history().len(), 8);
}

#[tokio::test]
async fn test_zero_categories_go_straight_to_final_analysis() {
    let generator = ScriptedGenerator::new(vec![
        Ok("Visão geral"),
        Ok("Nenhum erro relevante."),
        Ok("Nenhum erro encontrado"),
        Ok("Relatório final"),
    ]);
    let flow = flow(&generator, 1);
    let mut state = RemediationState::new(RubricDimension::LinguisticMechanisms);

    flow.advance(&mut state, ESSAY).await.unwrap();
    let report = flow.advance(&mut state, ESSAY).await.unwrap();
    assert_eq!(report, StepReport::NoErrors);
    assert_eq!(state.stage(), Stage::FinalAnalysis);

    let report = flow.advance(&mut state, ESSAY).await.unwrap();
    assert_eq!(
        report,
        StepReport::Final {
            competency: RubricDimension::LinguisticMechanisms,
            level: ProficiencyLevel::Basic,
            report: "Relatório final".to_string(),
        }
    );
    let final_prompt = generator.prompts().pop().unwrap();
    assert!(final_prompt.contains("Nível de proficiência final do aluno: Básico"));
}

#[tokio::test]
async fn test_unparseable_exercise_skips_category() {
    let generator = ScriptedGenerator::new(vec![
        Ok("Visão geral"),
        Ok("Erros encontrados"),
        Ok(GROUPED),
        Ok("Teoria da crase"),
        Ok("Desculpe, não consegui criar um exercício."),
    ]);
    let flow = flow(&generator, 1);
    let mut state = RemediationState::new(RubricDimension::NormMastery);

    flow.advance(&mut state, ESSAY).await.unwrap();
    flow.advance(&mut state, ESSAY).await.unwrap();
    let report = flow.advance(&mut state, ESSAY).await.unwrap();

    assert_eq!(
        report,
        StepReport::CategorySkipped {
            category: "Crase".to_string()
        }
    );
    assert_eq!((state.category_index(), state.level()), (1, ProficiencyLevel::Basic));
    assert_eq!(state.stage(), Stage::PerCategoryCorrection);
    assert_eq!(state.skipped(), ["Crase".to_string()]);
}

#[tokio::test]
async fn test_exhausted_step_leaves_state_unchanged() {
    let generator = ScriptedGenerator::new(vec![]);
    let flow = flow(&generator, 2);
    let mut state = state_with_first_exercise(&generator, &flow).await;

    // 评价失败
    let before = state.clone();
    let result = flow.submit_answer(&mut state, "Vou à escola").await;
    assert_eq!(
        result,
        Err(WorkflowError::StepFailed {
            step: "avaliação",
            attempts: 2,
            last_error: "roteiro esgotado".to_string(),
        })
    );
    assert_eq!(state, before);

    // 理论成功、练习失败
    generator.push("Correto: Sim");
    flow.submit_answer(&mut state, "Vou à escola").await.unwrap();
    let before = state.clone();
    generator.push("Teoria");
    let result = flow.advance(&mut state, ESSAY).await;
    assert!(matches!(
        result,
        Err(WorkflowError::StepFailed { step: "exercício", .. })
    ));
    assert_eq!(state, before);
    assert_eq!(state.level(), ProficiencyLevel::Intermediate);
}

#[tokio::test]
async fn test_answer_outside_correction_stage_is_rejected() {
    let generator = ScriptedGenerator::new(vec![]);
    let flow = flow(&generator, 1);
    let mut state = RemediationState::new(RubricDimension::NormMastery);

    let result = flow.submit_answer(&mut state, "resposta").await;
    assert_eq!(
        result,
        Err(WorkflowError::WrongStage {
            expected: Stage::PerCategoryCorrection,
            actual: Stage::Presentation,
        })
    );
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_prompts_are_grounded_with_knowledge() {
    let generator = ScriptedGenerator::new(vec![]);
    let knowledge = SnippetKnowledge::new(vec![KnowledgeSnippet {
        topic: "Crase".to_string(),
        keywords: vec!["acento grave".to_string()],
        text: "Crase é a fusão da preposição a com o artigo a.".to_string(),
    }]);
    let flow = flow(&generator, 1).with_knowledge(Arc::new(knowledge));

    state_with_first_exercise(&generator, &flow).await;

    let prompts = generator.prompts();
    // 理论提示词按类别标签检索
    let theory_prompt = &prompts[3];
    assert!(theory_prompt.contains("Base de conhecimento"));
    assert!(theory_prompt.contains("- Crase: Crase é a fusão da preposição a com o artigo a."));
    // 介绍提示词按能力名称检索，没有命中
    assert!(!prompts[0].contains("Base de conhecimento"));
}
