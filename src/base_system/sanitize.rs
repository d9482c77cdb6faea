//! 文件名合法化。
//!
//! 八类非法路径字符各自映射到一个固定的全角替代字符，
//! 同一非法字符的连续串折叠为单个替代字符。纯函数、全定义、幂等。

/// 非法字符 → 全角替代字符对照表。
const SUBSTITUTES: [(char, char); 9] = [
    ('|', '｜'),
    ('?', '？'),
    ('*', '＊'),
    ('<', '＜'),
    ('>', '＞'),
    ('"', '＂'),
    (':', '：'),
    ('\\', '＼'),
    ('/', '／'),
];

fn substitute(ch: char) -> Option<char> {
    SUBSTITUTES
        .iter()
        .find(|(from, _)| *from == ch)
        .map(|(_, to)| *to)
}

/// 将 `name` 中的非法路径字符替换为全角等价字符。
///
/// 连续重复的同一非法字符只产生一个替代字符，
/// 因此对任意输入都有 `sanitize(sanitize(x)) == sanitize(x)`。
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_forbidden: Option<char> = None;
    for ch in name.chars() {
        match substitute(ch) {
            Some(replacement) => {
                if last_forbidden != Some(ch) {
                    out.push(replacement);
                }
                last_forbidden = Some(ch);
            }
            None => {
                out.push(ch);
                last_forbidden = None;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_each_forbidden_class() {
        let input = r#"a|b?c*d<e>f"g:h\i/j"#;
        let cleaned = sanitize(input);
        for (from, to) in SUBSTITUTES {
            assert!(!cleaned.contains(from), "{from} 应被替换");
            assert!(cleaned.contains(to), "{to} 应出现在结果中");
        }
        assert_eq!(cleaned, "a｜b？c＊d＜e＞f＂g：h＼i／j");
    }

    #[test]
    fn collapses_runs_of_the_same_character() {
        assert_eq!(sanitize("a|||b"), "a｜b");
        assert_eq!(sanitize("what???"), "what？");
        // 不同非法字符相邻时各自保留一个替代字符。
        assert_eq!(sanitize("a|?|b"), "a｜？｜b");
    }

    #[test]
    fn idempotent_for_mixed_input() {
        let inputs = [
            "a|b?c",
            r#"全部：八类 |?*<>":\/ 混合"#,
            "",
            "already clean",
            "|||???***",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "对 {input:?} 不幂等");
        }
    }

    #[test]
    fn keeps_legal_text_untouched() {
        assert_eq!(sanitize("進擊的巨人 第01集"), "進擊的巨人 第01集");
    }
}
