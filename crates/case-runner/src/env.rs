//! 환경 바인딩 — 선언된 환경변수 해석 및 실행 컨텍스트 구성
//!
//! 케이스의 `[environment]` 섹션은 `$NAME` / `${NAME}` 참조를 포함할 수
//! 있습니다. 참조는 다음 순서로 해석됩니다:
//!
//! 1. 케이스에 선언된 다른 변수 (선언 순서와 무관하게 재귀적으로 해석)
//! 2. 러너 빌트인 (`CASE_DIR`, `CASE_NAME`, `SUITE_DIR`)
//! 3. 부모 프로세스의 환경변수
//!
//! 어디에서도 찾을 수 없는 참조는 로드 시점 에러입니다. 참조 순환도
//! 에러입니다. 해석된 매핑은 각 페이즈의 실행 컨텍스트에 명시적으로
//! 전달되며, 전역 가변 상태는 없습니다.

use std::collections::BTreeMap;
use std::path::Path;

use caseflow_core::types::TestCase;

use crate::error::CaseRunnerError;

/// 케이스 디렉토리 빌트인 변수명
pub const BUILTIN_CASE_DIR: &str = "CASE_DIR";
/// 케이스 이름 빌트인 변수명
pub const BUILTIN_CASE_NAME: &str = "CASE_NAME";
/// 스위트 루트 빌트인 변수명
pub const BUILTIN_SUITE_DIR: &str = "SUITE_DIR";

/// 러너가 주입하는 빌트인 변수를 생성합니다.
pub fn builtin_env(case: &TestCase, suite_dir: &Path) -> BTreeMap<String, String> {
    let mut builtins = BTreeMap::new();
    builtins.insert(
        BUILTIN_CASE_DIR.to_owned(),
        case.dir.display().to_string(),
    );
    builtins.insert(BUILTIN_CASE_NAME.to_owned(), case.name.clone());
    builtins.insert(
        BUILTIN_SUITE_DIR.to_owned(),
        suite_dir.display().to_string(),
    );
    builtins
}

/// 케이스의 선언 환경을 해석하여 페이즈 실행용 매핑을 만듭니다.
///
/// 반환 매핑은 빌트인과 해석된 선언 변수를 합친 것입니다.
/// 같은 이름이 양쪽에 있으면 선언 변수가 우선합니다.
pub fn bind_environment(
    case: &TestCase,
    builtins: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, CaseRunnerError> {
    let mut resolved: BTreeMap<String, String> = BTreeMap::new();
    let mut visiting: Vec<String> = Vec::new();
    for name in case.environment.keys() {
        resolve_var(
            name,
            &case.environment,
            builtins,
            &mut resolved,
            &mut visiting,
        )?;
    }

    let mut bound = builtins.clone();
    bound.extend(resolved);
    Ok(bound)
}

/// 변수 하나를 재귀적으로 해석합니다.
///
/// `visiting` 스택으로 참조 순환을 탐지합니다.
fn resolve_var(
    name: &str,
    declared: &BTreeMap<String, String>,
    builtins: &BTreeMap<String, String>,
    resolved: &mut BTreeMap<String, String>,
    visiting: &mut Vec<String>,
) -> Result<String, CaseRunnerError> {
    if let Some(value) = resolved.get(name) {
        return Ok(value.clone());
    }
    if visiting.iter().any(|n| n == name) {
        return Err(CaseRunnerError::EnvCycle {
            name: name.to_owned(),
        });
    }

    let raw = declared
        .get(name)
        .cloned()
        .unwrap_or_default();

    visiting.push(name.to_owned());
    let value = substitute(&raw, &mut |reference: &str| {
        if let Some(v) = resolved.get(reference) {
            return Ok(v.clone());
        }
        if declared.contains_key(reference) {
            return resolve_var(reference, declared, builtins, resolved, visiting);
        }
        if let Some(v) = builtins.get(reference) {
            return Ok(v.clone());
        }
        if let Ok(v) = std::env::var(reference) {
            return Ok(v);
        }
        Err(CaseRunnerError::EnvUnresolved {
            name: name.to_owned(),
            reference: reference.to_owned(),
        })
    })?;
    visiting.pop();

    resolved.insert(name.to_owned(), value.clone());
    Ok(value)
}

/// 문자열 안의 `$NAME` / `${NAME}` 참조를 치환합니다.
///
/// `$$`는 리터럴 `$`로 치환됩니다. 잘 형성되지 않은 참조
/// (닫히지 않은 `${`, 식별자가 따라오지 않는 `$`)는 리터럴로 남습니다.
pub fn substitute<F>(input: &str, lookup: &mut F) -> Result<String, CaseRunnerError>
where
    F: FnMut(&str) -> Result<String, CaseRunnerError>,
{
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                chars.next();
                out.push('$');
            }
            Some('{') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for c2 in chars.by_ref() {
                    if c2 == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c2);
                }
                if closed && !name.is_empty() && is_identifier(&name) {
                    out.push_str(&lookup(&name)?);
                } else {
                    out.push_str("${");
                    out.push_str(&name);
                    if closed {
                        out.push('}');
                    }
                }
            }
            Some(c2) if c2.is_ascii_alphabetic() || *c2 == '_' => {
                let mut name = String::new();
                while let Some(c2) = chars.peek() {
                    if c2.is_ascii_alphanumeric() || *c2 == '_' {
                        name.push(*c2);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(&lookup(&name)?);
            }
            _ => out.push('$'),
        }
    }

    Ok(out)
}

/// 환경변수 이름으로 유효한 식별자인지 확인합니다.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
