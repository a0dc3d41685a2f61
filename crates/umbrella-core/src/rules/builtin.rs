//! Builtin signature table.
//!
//! Each construct family is covered by exactly one signature: a single
//! occurrence such as `os.system(` must never trigger two entries, otherwise
//! distinct-signature counting would double count it. Keep new entries
//! disjoint from the existing ones.

use crate::rules::catalog::{Category, MatcherSpec, Severity, SignatureSpec};

pub const BUILTIN_SIGNATURES: &[SignatureSpec] = &[
    SignatureSpec {
        id: "UMB-EVAL-01",
        title: "Dynamic code evaluation",
        category: Category::CodeExecution,
        severity: Severity::High,
        // Python eval()/exec(), mel.eval(), MEL `eval "..."` / `eval $cmd`.
        matcher: MatcherSpec::Pattern(r#"\b(?:eval|exec)\s*\(|\beval\s+["$]"#),
    },
    SignatureSpec {
        id: "UMB-EVAL-02",
        title: "MEL to Python bridge",
        category: Category::CodeExecution,
        severity: Severity::High,
        matcher: MatcherSpec::Pattern(r"\bpython\s*\("),
    },
    SignatureSpec {
        id: "UMB-IMPORT-01",
        title: "Dynamic module import",
        category: Category::DynamicImport,
        severity: Severity::Medium,
        matcher: MatcherSpec::Literal("__import__"),
    },
    SignatureSpec {
        id: "UMB-SHELL-01",
        title: "Python process invocation",
        category: Category::ShellEscape,
        severity: Severity::Critical,
        matcher: MatcherSpec::Pattern(
            r"\b(?:os\.(?:system|popen[234]?|spawn[lv]p?e?|exec[lv]p?e?)|subprocess\.(?:call|run|Popen|check_call|check_output|getoutput|getstatusoutput))\s*\(",
        ),
    },
    SignatureSpec {
        id: "UMB-SHELL-02",
        title: "MEL shell invocation",
        category: Category::ShellEscape,
        severity: Severity::Critical,
        // Bare `system(` / `popen(`; attribute calls like `os.system(` belong to UMB-SHELL-01.
        matcher: MatcherSpec::Pattern(r"(?m)(?:^|[^.\w\r\n])(?:system|popen)\s*\("),
    },
    SignatureSpec {
        id: "UMB-DEFER-01",
        title: "Deferred execution hook",
        category: Category::DeferredExecution,
        severity: Severity::High,
        matcher: MatcherSpec::Pattern(r"\b(?:evalDeferred|scriptJob)\b"),
    },
    SignatureSpec {
        id: "UMB-FS-01",
        title: "Destructive shell command",
        category: Category::FilesystemDestructive,
        severity: Severity::Critical,
        matcher: MatcherSpec::Pattern(
            r"\brm\s+-[A-Za-z]*(?:[rR][A-Za-z]*f|f[A-Za-z]*[rR])|\b(?:del|rd|rmdir)\s+/[sSqQ]\b|\bformat\s+[A-Za-z]:",
        ),
    },
    SignatureSpec {
        id: "UMB-FS-02",
        title: "Filesystem deletion call",
        category: Category::FilesystemDestructive,
        severity: Severity::High,
        matcher: MatcherSpec::Pattern(
            r"\b(?:shutil\.rmtree|os\.(?:remove|unlink|rmdir|removedirs))\s*\(|\bsysFile\s+-(?:delete|removeEmptyDir)\b",
        ),
    },
];
