//! # 编码格式
//!
//! 编码的字母表、长度与校验规则。
//!
//! ## 依赖关系
//! - 被 `codegen/generator.rs` 使用

use crate::error::{Result, SgdiError};

use rand::Rng;

/// 标准编码长度
pub const STANDARD_LENGTH: usize = 10;

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";

/// 编码格式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeFormat {
    /// 4 位大写字母 + 6 位数字，例如 `XKPA456789`
    Inacal,
    /// 固定前缀（1-4 位字母）+ 数字补足 10 位
    Prefixed(String),
    /// 自定义字母表与长度
    Alphabet { alphabet: Vec<char>, length: usize },
}

impl Default for CodeFormat {
    fn default() -> Self {
        CodeFormat::Inacal
    }
}

impl CodeFormat {
    /// 构造带前缀的格式
    pub fn prefixed(prefix: &str) -> Result<Self> {
        if prefix.is_empty() || prefix.len() > 4 || !prefix.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(SgdiError::InvalidArgument(format!(
                "prefix '{}' must be 1-4 ASCII letters",
                prefix
            )));
        }
        Ok(CodeFormat::Prefixed(prefix.to_ascii_uppercase()))
    }

    /// 构造自定义字母表格式
    pub fn alphabet(alphabet: &str, length: usize) -> Result<Self> {
        let mut chars: Vec<char> = alphabet.chars().collect();
        chars.sort_unstable();
        chars.dedup();

        if chars.is_empty() || length == 0 {
            return Err(SgdiError::InvalidArgument(
                "alphabet and length must be non-empty".to_string(),
            ));
        }
        if let Some(bad) = chars
            .iter()
            .find(|c| !(c.is_ascii_uppercase() || c.is_ascii_digit()))
        {
            return Err(SgdiError::InvalidArgument(format!(
                "alphabet character '{}' is not an uppercase letter or digit",
                bad
            )));
        }
        Ok(CodeFormat::Alphabet {
            alphabet: chars,
            length,
        })
    }

    /// 编码长度
    pub fn length(&self) -> usize {
        match self {
            CodeFormat::Inacal | CodeFormat::Prefixed(_) => STANDARD_LENGTH,
            CodeFormat::Alphabet { length, .. } => *length,
        }
    }

    /// 编码空间大小（溢出时饱和）
    pub fn keyspace(&self) -> u128 {
        match self {
            CodeFormat::Inacal => 26u128.pow(4) * 10u128.pow(6),
            CodeFormat::Prefixed(prefix) => 10u128.pow((STANDARD_LENGTH - prefix.len()) as u32),
            CodeFormat::Alphabet { alphabet, length } => {
                (alphabet.len() as u128).saturating_pow((*length).min(u32::MAX as usize) as u32)
            }
        }
    }

    /// 抽取一个候选编码
    pub fn draw<R: Rng>(&self, rng: &mut R) -> String {
        let pick = |rng: &mut R, set: &[u8], n: usize| -> String {
            (0..n)
                .map(|_| set[rng.gen_range(0..set.len())] as char)
                .collect()
        };

        match self {
            CodeFormat::Inacal => {
                let mut code = pick(&mut *rng, LETTERS, 4);
                code.push_str(&pick(&mut *rng, DIGITS, 6));
                code
            }
            CodeFormat::Prefixed(prefix) => {
                let mut code = prefix.clone();
                code.push_str(&pick(rng, DIGITS, STANDARD_LENGTH - prefix.len()));
                code
            }
            CodeFormat::Alphabet { alphabet, length } => (0..*length)
                .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
                .collect(),
        }
    }

    /// 校验编码：非空、大写字母数字、长度正确
    pub fn validate(&self, code: &str) -> Result<()> {
        let invalid = |reason: &str| SgdiError::InvalidCode {
            code: code.to_string(),
            reason: reason.to_string(),
        };

        if code.trim().is_empty() {
            return Err(invalid("empty code"));
        }
        if code.chars().count() != self.length() {
            return Err(invalid(&format!("expected {} characters", self.length())));
        }
        if !code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err(invalid("only uppercase letters and digits are allowed"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inacal_shape() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let code = CodeFormat::Inacal.draw(&mut rng);
            assert_eq!(code.len(), 10);
            assert!(code[..4].chars().all(|c| c.is_ascii_uppercase()));
            assert!(code[4..].chars().all(|c| c.is_ascii_digit()));
            assert!(CodeFormat::Inacal.validate(&code).is_ok());
        }
    }

    #[test]
    fn test_prefixed() {
        let format = CodeFormat::prefixed("agua").unwrap();
        let code = format.draw(&mut rand::thread_rng());
        assert!(code.starts_with("AGUA"));
        assert_eq!(code.len(), 10);
        assert_eq!(format.keyspace(), 1_000_000);

        assert!(CodeFormat::prefixed("TOOLONG").is_err());
        assert!(CodeFormat::prefixed("A1").is_err());
    }

    #[test]
    fn test_alphabet_validation() {
        let format = CodeFormat::alphabet("BA", 3).unwrap();
        assert_eq!(format.keyspace(), 8);
        let code = format.draw(&mut rand::thread_rng());
        assert!(code.chars().all(|c| c == 'A' || c == 'B'));

        assert!(CodeFormat::alphabet("ab", 3).is_err());
        assert!(CodeFormat::alphabet("", 3).is_err());
        assert!(CodeFormat::Inacal.validate("abcd123456").is_err());
        assert!(CodeFormat::Inacal.validate("ABCD12345").is_err());
    }
}
