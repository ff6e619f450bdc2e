//! 提示词模板
//!
//! 分析模板中的标记与 `parser::rubric` 使用的标记必须保持一致

use crate::models::{ErrorCategory, ProficiencyLevel, RubricDimension};
use crate::parser::rubric::{
    BEGIN_MARKER, END_MARKER, FOLLOW_UP_MARKER, GENERAL_COMMENT_MARKER, WEAK_DIMENSIONS_MARKER,
};

/// 构建作文评分提示词
pub fn analysis_prompt(theme: &str, essay_text: &str) -> String {
    let mut sections = String::new();
    for dimension in RubricDimension::ALL {
        sections.push_str(&format!(
            "{}. {} (0-200 pontos):\n[Nota numérica]/200\n[{}]\n\n",
            dimension.number(),
            dimension.name(),
            dimension.feedback_hint()
        ));
    }

    format!(
        r#"Analise a seguinte redação sobre o tema "{theme}". Forneça uma análise completa seguindo estritamente o formato abaixo:

{BEGIN_MARKER}

{sections}Nota Total: [Soma das notas acima]/1000

{GENERAL_COMMENT_MARKER}
[Forneça um comentário geral de 2-3 frases sobre os principais pontos fortes e fracos da redação]

{WEAK_DIMENSIONS_MARKER}
[Liste as competências com menor pontuação]

{END_MARKER}

{FOLLOW_UP_MARKER}
[Faça uma pergunta clara sobre o interesse do aluno em prosseguir em uma trilha de aprendizado personalizada para reforçar seus pontos de melhoria]

Importante: As notas para cada competência devem ser múltiplos de 40 (0, 40, 80, 120, 160 ou 200).
No feedback de cada competência, descreva cada problema no formato "Categoria: descrição".

Redação a ser analisada:
{essay_text}
"#
    )
}

/// 能力维度介绍
pub fn overview_prompt(competency: RubricDimension) -> String {
    format!(
        r#"Apresente a Competência '{competency}' do ENEM, explicando sua importância e o que será avaliado.
Forneça uma visão geral amigável para contextualizar o estudante."#
    )
}

/// 在作文中查找与该能力相关的错误
pub fn error_scan_prompt(competency: RubricDimension, essay_text: &str) -> String {
    format!(
        r#"Analise o seguinte texto, identificando todos os erros possíveis relacionados à Competência '{competency}' do ENEM.
Liste cada erro encontrado, indicando o tipo de erro.

Texto da redação:
{essay_text}"#
    )
}

/// 将错误按类别分组
pub fn grouping_prompt(competency: RubricDimension, errors: &str) -> String {
    format!(
        r#"Agrupe os erros identificados por categoria, considerando a Competência '{competency}':

{errors}

Apresente os resultados em forma de lista, uma categoria por linha, no formato "Categoria: erros correspondentes".
Se não houver erros, responda apenas "Nenhum erro encontrado"."#
    )
}

/// 讲解某类错误背后的规则
pub fn theory_prompt(category: &ErrorCategory, competency: RubricDimension) -> String {
    format!(
        r#"Explique a teoria ou conceito relacionado ao erro '{label}' na Competência '{competency}'.
Contexto do erro: {description}
Forneça uma explicação clara e concisa, adequada para um estudante do Ensino Médio, com exemplos."#,
        label = category.label,
        description = category.description,
    )
}

/// 生成一道分级练习
pub fn exercise_prompt(
    category: &ErrorCategory,
    competency: RubricDimension,
    level: ProficiencyLevel,
) -> String {
    format!(
        r#"Crie um exercício de nível {level} para praticar a correção do erro '{label}' na Competência '{competency}'.
O exercício deve ajudar o aluno a compreender e corrigir esse tipo de erro.
Forneça também a resposta correta para este exercício.

Formato da resposta:
Exercício: [Texto do exercício]
Resposta correta: [Resposta correta do exercício]"#,
        label = category.label,
    )
}

/// 评价学生答案
pub fn evaluation_prompt(
    category: &ErrorCategory,
    competency: RubricDimension,
    exercise: &str,
    correct_answer: &str,
    learner_answer: &str,
) -> String {
    format!(
        r#"Avalie a seguinte resposta do aluno ao exercício sobre '{label}' na Competência '{competency}':

Exercício: {exercise}
Resposta correta: {correct_answer}
Resposta do aluno: {learner_answer}

Determine se a resposta do aluno está correta. Se estiver incorreta, forneça um feedback detalhado,
indicando o que está errado e como pode ser melhorado.

Responda no formato:
Correto: [Sim/Não]
Feedback: [Seu feedback detalhado]"#,
        label = category.label,
    )
}

/// 最终分析：薄弱点地图、统计摘要、学习建议
pub fn final_analysis_prompt(
    competency: RubricDimension,
    level: ProficiencyLevel,
    statistics: &str,
) -> String {
    format!(
        r#"Com base nas correções realizadas para a Competência '{competency}' do ENEM, crie:

1. Um mapa de fragilidades, destacando as áreas onde o aluno apresentou maior dificuldade.
2. Um breve relatório estatístico, apontando as áreas de maior defasagem e seu impacto potencial na nota do ENEM.
3. Sugestões específicas para estudo futuro focado nesta competência.
4. Recursos e estratégias de estudo recomendados.

Nível de proficiência final do aluno: {level}

Estatísticas da trilha:
{statistics}"#
    )
}

/// 把知识库片段附加到提示词后面
pub fn ground(prompt: String, snippets: &[String]) -> String {
    if snippets.is_empty() {
        return prompt;
    }

    let context: Vec<String> = snippets.iter().map(|s| format!("- {}", s)).collect();
    format!(
        "{}\n\nBase de conhecimento (use para fundamentar a resposta):\n{}",
        prompt,
        context.join("\n")
    )
}
