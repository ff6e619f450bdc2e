use serde::{Deserialize, Serialize};

/// 评分维度（ENEM 作文五项能力）
///
/// 顺序仅用于展示，不参与计分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RubricDimension {
    /// 规范语言掌握
    NormMastery = 1,
    /// 主题理解
    ThemeComprehension = 2,
    /// 信息选择与组织
    InformationOrganization = 3,
    /// 语言衔接机制
    LinguisticMechanisms = 4,
    /// 干预方案
    InterventionProposal = 5,
}

/// 单项满分
pub const DIMENSION_MAX_SCORE: u32 = 200;

/// 分数步长，有效分数只能是它的整数倍
pub const SCORE_STEP: u32 = 40;

/// 总分满分
pub const TOTAL_MAX_SCORE: u32 = 1000;

impl RubricDimension {
    /// 按展示顺序排列的全部维度
    pub const ALL: [RubricDimension; 5] = [
        RubricDimension::NormMastery,
        RubricDimension::ThemeComprehension,
        RubricDimension::InformationOrganization,
        RubricDimension::LinguisticMechanisms,
        RubricDimension::InterventionProposal,
    ];

    /// 获取维度编号（1-5，即模板中的标题序号）
    pub fn number(self) -> u8 {
        self as u8
    }

    /// 获取标准名称（与分析模板中的标题一致）
    pub fn name(self) -> &'static str {
        match self {
            RubricDimension::NormMastery => "Domínio da Norma Culta",
            RubricDimension::ThemeComprehension => "Compreensão do Tema",
            RubricDimension::InformationOrganization => "Seleção e Organização das Informações",
            RubricDimension::LinguisticMechanisms => "Conhecimento dos Mecanismos Linguísticos",
            RubricDimension::InterventionProposal => "Proposta de Intervenção",
        }
    }

    /// 模板中对该维度反馈内容的提示
    pub fn feedback_hint(self) -> &'static str {
        match self {
            RubricDimension::NormMastery => {
                "Feedback específico sobre gramática, ortografia e pontuação, com exemplos de correções"
            }
            RubricDimension::ThemeComprehension => {
                "Feedback sobre a relevância e profundidade da abordagem do tema, sugerindo inclusões para enriquecimento"
            }
            RubricDimension::InformationOrganization => {
                "Feedback sobre a lógica e clareza da argumentação, com sugestões para melhorar a estrutura"
            }
            RubricDimension::LinguisticMechanisms => {
                "Feedback sobre o uso de recursos linguísticos para argumentação, com exemplos para aprimoramento"
            }
            RubricDimension::InterventionProposal => {
                "Feedback sobre a proposta de solução, incentivando detalhamento e viabilidade"
            }
        }
    }

    /// 从编号解析维度
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(RubricDimension::NormMastery),
            2 => Some(RubricDimension::ThemeComprehension),
            3 => Some(RubricDimension::InformationOrganization),
            4 => Some(RubricDimension::LinguisticMechanisms),
            5 => Some(RubricDimension::InterventionProposal),
            _ => None,
        }
    }
}

impl std::fmt::Display for RubricDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
