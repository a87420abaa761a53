use crate::engines::generation::genome::{Chromosome, SearchSpace};
use crate::error::EvalError;

/// Turns a chromosome into runnable model source. Must be deterministic:
/// the hash of the output is the candidate's identity.
pub trait CodeGenerator {
    /// Architecture family name used in model and stats file names
    fn model_family(&self) -> &str;

    fn generate(&self, chromosome: &Chromosome) -> Result<String, EvalError>;
}

const FRACTAL_NET_TEMPLATE: &str = r#"import torch
import torch.nn as nn
import torch.nn.functional as F


def supported_hyperparameters():
    return {'lr', 'momentum'}


N_COLUMNS = {{N_COLUMNS}}
N_BLOCKS = {{N_BLOCKS}}
START_CHANNELS = {{START_CHANNELS}}
DROP_PATH = {{DROP_PATH}}
DROPOUT = {{DROPOUT}}


class ConvBlock(nn.Module):
    def __init__(self, in_ch, out_ch, dropout):
        super().__init__()
        self.conv = nn.Conv2d(in_ch, out_ch, kernel_size=3, padding=1, bias=False)
        self.bn = nn.BatchNorm2d(out_ch)
        self.drop = nn.Dropout2d(dropout) if dropout > 0 else nn.Identity()

    def forward(self, x):
        return self.drop(F.relu(self.bn(self.conv(x))))


class FractalBlock(nn.Module):
    def __init__(self, in_ch, out_ch, n_columns, drop_path, dropout):
        super().__init__()
        self.drop_path = drop_path
        self.columns = nn.ModuleList()
        for c in range(n_columns):
            layers = [ConvBlock(in_ch if i == 0 else out_ch, out_ch, dropout) for i in range(2 ** c)]
            self.columns.append(nn.Sequential(*layers))

    def forward(self, x):
        outs = [column(x) for column in self.columns]
        if self.training and self.drop_path > 0:
            kept = [o for o in outs if torch.rand(1).item() >= self.drop_path]
            outs = kept or [outs[torch.randint(len(outs), (1,)).item()]]
        return torch.stack(outs).mean(dim=0)


class Net(nn.Module):
    def __init__(self, in_shape, out_shape, prm, device):
        super().__init__()
        self.device = device
        channels = in_shape[1]
        width = START_CHANNELS
        blocks = []
        for b in range(N_BLOCKS):
            blocks.append(FractalBlock(channels, width, N_COLUMNS, DROP_PATH, DROPOUT))
            blocks.append(nn.MaxPool2d(2) if b < N_BLOCKS - 1 else nn.AdaptiveAvgPool2d(1))
            channels = width
            width = min(width * 2, 512)
        self.features = nn.Sequential(*blocks)
        self.classifier = nn.Linear(channels, out_shape[0])

    def forward(self, x):
        x = self.features(x)
        return self.classifier(torch.flatten(x, 1))

    def train_setup(self, prm):
        self.to(self.device)
        self.criteria = (nn.CrossEntropyLoss().to(self.device),)
        self.optimizer = torch.optim.SGD(self.parameters(), lr=prm['lr'], momentum=prm['momentum'])

    def learn(self, train_data):
        self.train()
        for inputs, labels in train_data:
            inputs, labels = inputs.to(self.device), labels.to(self.device)
            self.optimizer.zero_grad()
            loss = self.criteria[0](self(inputs), labels)
            loss.backward()
            nn.utils.clip_grad_norm_(self.parameters(), 3)
            self.optimizer.step()
"#;

/// FractalNet source generator.
///
/// Only the structural genes are rendered. `lr` and `momentum` reach the
/// harness as hyperparameters, so chromosomes differing only in those
/// render to the same source and are evaluated once.
#[derive(Debug, Clone, Default)]
pub struct FractalNetTemplate;

impl FractalNetTemplate {
    pub fn new() -> Self {
        Self
    }

    /// Built-in search space: structure plus the two SGD hyperparameters
    pub fn search_space() -> SearchSpace {
        SearchSpace::new()
            .with_param("n_columns", [2i64, 3, 4])
            .with_param("n_blocks", [2i64, 3, 4])
            .with_param("start_channels", [16i64, 32, 64])
            .with_param("drop_path", [0.0, 0.15, 0.3])
            .with_param("dropout", [0.0, 0.1, 0.2, 0.3])
            .with_param("lr", [0.001, 0.005, 0.01, 0.05])
            .with_param("momentum", [0.8, 0.9, 0.95])
    }

    fn int_gene(chromosome: &Chromosome, name: &str, range: std::ops::RangeInclusive<i64>) -> Result<i64, EvalError> {
        let value = chromosome
            .get_i64(name)
            .ok_or_else(|| EvalError::CodeGeneration(format!("missing integer gene '{}'", name)))?;
        if !range.contains(&value) {
            return Err(EvalError::CodeGeneration(format!(
                "gene '{}' = {} outside {:?}",
                name, value, range
            )));
        }
        Ok(value)
    }

    fn rate_gene(chromosome: &Chromosome, name: &str) -> Result<f64, EvalError> {
        let value = chromosome
            .get_f64(name)
            .ok_or_else(|| EvalError::CodeGeneration(format!("missing numeric gene '{}'", name)))?;
        if !(0.0..1.0).contains(&value) {
            return Err(EvalError::CodeGeneration(format!(
                "gene '{}' = {} must be in [0, 1)",
                name, value
            )));
        }
        Ok(value)
    }
}

impl CodeGenerator for FractalNetTemplate {
    fn model_family(&self) -> &str {
        "FractalNet"
    }

    fn generate(&self, chromosome: &Chromosome) -> Result<String, EvalError> {
        let n_columns = Self::int_gene(chromosome, "n_columns", 1..=6)?;
        let n_blocks = Self::int_gene(chromosome, "n_blocks", 1..=8)?;
        let start_channels = Self::int_gene(chromosome, "start_channels", 1..=512)?;
        let drop_path = Self::rate_gene(chromosome, "drop_path")?;
        let dropout = Self::rate_gene(chromosome, "dropout")?;

        Ok(FRACTAL_NET_TEMPLATE
            .replace("{{N_COLUMNS}}", &n_columns.to_string())
            .replace("{{N_BLOCKS}}", &n_blocks.to_string())
            .replace("{{START_CHANNELS}}", &start_channels.to_string())
            .replace("{{DROP_PATH}}", &format!("{:?}", drop_path))
            .replace("{{DROPOUT}}", &format!("{:?}", dropout)))
    }
}
