//! Instruction text for each task kind.

use super::contract::TaskKind;

/// Appended to the prompt after a rejected attempt.
const RETRY_NOTICE: &str = "IMPORTANT: your previous response was invalid";

#[must_use]
pub fn refactor_file(file_path: &str, source: &str, key_separator: &str) -> String {
    format!(
        r#"You are internationalizing a Next.js application that uses next-intl.

Rewrite the file below so that every user-facing literal string is replaced by a
translation lookup. Add `import {{ useTranslations }} from "next-intl";` and
`const t = useTranslations();` in client components, or
`const t = await getTranslations();` from "next-intl/server" in async server
components. Look up text with `t("key")`. Keys are lowercase snake_case; nested
namespaces are joined with "{key_separator}" and a leaf name never contains "{key_separator}".
Keys in "translations" are full dictionary paths: with `useTranslations("Ns")`,
`t("title")` is listed as "Ns{key_separator}title".
Keep placeholders such as {{name}} verbatim. Do not change any behaviour.

{contract}

File: {file_path}
```
{source}
```"#,
        contract = contract(TaskKind::RefactorFile),
    )
}

#[must_use]
pub fn translate_text(text: &str, source_locale: &str, target_locale: &str) -> String {
    format!(
        r#"Translate the following user interface text from "{source_locale}" to "{target_locale}".
Keep placeholders such as {{name}} and any markup tags exactly as they are.

{contract}

Text:
{text}"#,
        contract = contract(TaskKind::TranslateText),
    )
}

#[must_use]
pub fn translate_batch(payload: &str, source_locale: &str, target_locale: &str) -> String {
    format!(
        r#"Translate every string value of the JSON object below from "{source_locale}" to "{target_locale}".
Keep placeholders such as {{name}} and any markup tags exactly as they are.

{contract}

Input:
{payload}"#,
        contract = contract(TaskKind::TranslateBatch),
    )
}

#[must_use]
pub fn extract_build_errors(build_log: &str) -> String {
    format!(
        r#"Extract every compile or type error from this Next.js build output.

{contract}

Build output:
{build_log}"#,
        contract = contract(TaskKind::ExtractBuildErrors),
    )
}

#[must_use]
pub fn fix_compile_error(file_path: &str, source: &str, error_description: &str) -> String {
    format!(
        r#"The file below fails to compile with this error:
{error_description}

Fix the error with the smallest possible change.

{contract}

File: {file_path}
```
{source}
```"#,
        contract = contract(TaskKind::FixCompileError),
    )
}

/// Response contract stated in every prompt for the task.
#[must_use]
pub const fn contract(task: TaskKind) -> &'static str {
    match task {
        TaskKind::RefactorFile => {
            r#"Respond with a single JSON object and nothing else:
{"needsUpdate": boolean, "updatedCode": string, "translations": {"<key>": "<original text>"}}
If the file has no user-facing text, respond {"needsUpdate": false, "updatedCode": "", "translations": {}}.
If needsUpdate is true, updatedCode must contain the complete file."#
        }
        TaskKind::TranslateText => "Respond with the translated text only, without quotes or explanations.",
        TaskKind::TranslateBatch => {
            "Respond with a single JSON object that has exactly the same keys and nesting as the input, \
             with every string value translated. Do not add, drop or rename keys."
        }
        TaskKind::ExtractBuildErrors => {
            r#"Respond with a single JSON object and nothing else:
{"extractedErrors": [{"filePath": string, "errorType": string, "errorDescription": string}]}"#
        }
        TaskKind::FixCompileError => {
            r#"Respond with a single JSON object and nothing else:
{"fixExplanation": string, "updatedCode": string}
updatedCode must contain the complete fixed file."#
        }
    }
}

/// Amends a prompt after `attempt` rejected responses.
#[must_use]
pub fn with_retry_notice(prompt: &str, task: TaskKind, attempt: u32, reason: &str) -> String {
    format!(
        "{prompt}\n\n{RETRY_NOTICE} (attempt {attempt}: {reason}). \
         Follow the required format exactly.\n{}",
        contract(task)
    )
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn refactor_prompt_embeds_source_and_contract() {
        let prompt = refactor_file("app/page.tsx", "<h1>Welcome</h1>", ".");

        assert_that!(prompt, contains_substring("File: app/page.tsx"));
        assert_that!(prompt, contains_substring("<h1>Welcome</h1>"));
        assert_that!(prompt, contains_substring("\"needsUpdate\": boolean"));
        assert_that!(prompt, contains_substring("{name}"));
    }

    #[rstest]
    fn translate_prompts_name_both_locales() {
        let single = translate_text("Hola", "es", "en");
        let batch = translate_batch(r#"{"greeting": "Hola"}"#, "es", "en");

        assert_that!(single, all![contains_substring("\"es\""), contains_substring("\"en\"")]);
        assert_that!(batch, contains_substring(r#"{"greeting": "Hola"}"#));
        assert_that!(batch, contains_substring("exactly the same keys"));
    }

    #[rstest]
    fn retry_notice_repeats_contract() {
        let prompt = with_retry_notice("base", TaskKind::FixCompileError, 1, "missing field");

        assert_that!(prompt, starts_with("base"));
        assert_that!(prompt, contains_substring("previous response was invalid"));
        assert_that!(prompt, contains_substring("missing field"));
        assert_that!(prompt, contains_substring("fixExplanation"));
    }
}
