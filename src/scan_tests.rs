#[cfg(test)]
mod tests {
    use crate::discovery::{scan_project, ScanOptions};
    use crate::error::ReportError;
    use std::fs;
    use std::path::PathBuf;

    struct Fixture {
        root: PathBuf,
    }

    impl Fixture {
        fn new(name: &str) -> Self {
            let root = std::env::temp_dir().join(format!("tachui_scan_{}_{}", name, std::process::id()));
            fs::remove_dir_all(&root).ok();
            let write = |rel: &str, body: &str| {
                let path = root.join(rel);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(path, body).unwrap();
            };
            write("src/a.ts", r#"export const x = Text("Hi").build().concat(Text("there"));"#);
            write("src/b.js", "export const y = [1, 2].concat([3]);");
            write("src/bad.ts", "export const = ;");
            write("node_modules/pkg/index.js", r#"Text("a").build().concat(Text("b"));"#);
            write("README.md", r#"Text("a").build().concat(Text("b"))"#);
            Fixture { root }
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            fs::remove_dir_all(&self.root).ok();
        }
    }

    #[test]
    fn test_scan_aggregates_and_warns() {
        let fx = Fixture::new("basic");
        let report = scan_project(&fx.root, &ScanOptions::default()).unwrap();

        assert_eq!(report.summary.total_patterns, 1);
        assert_eq!(report.summary.static_patterns, 1);
        let paths: Vec<_> = report.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/a.ts", "src/b.js"]);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("bad.ts"));
        assert!(report.files[0].patterns.is_none());
        assert!(report.total_duration_ms.is_none());
    }

    #[test]
    fn test_scan_flags() {
        let fx = Fixture::new("flags");
        let output = fx.root.join("out").join("report.json");
        let options = ScanOptions {
            detailed: true,
            performance: true,
            concatenation_only: true,
            output: Some(output.clone()),
            ..ScanOptions::default()
        };
        let report = scan_project(&fx.root, &options).unwrap();

        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].path, "src/a.ts");
        assert_eq!(report.files[0].patterns.as_ref().map(Vec::len), Some(1));
        assert!(report.files[0].duration_ms.is_some());
        assert!(report.total_duration_ms.is_some());

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(json["summary"]["totalPatterns"], 1);
        assert_eq!(json["files"][0]["patternCount"], 1);
    }

    #[test]
    fn test_scan_custom_pattern() {
        let fx = Fixture::new("pattern");
        let options = ScanOptions {
            pattern: "src/*.js".to_string(),
            ..ScanOptions::default()
        };
        let report = scan_project(&fx.root, &options).unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.summary.total_patterns, 0);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_scan_with_cache_is_stable() {
        let fx = Fixture::new("cache");
        let options = ScanOptions {
            cache_dir: Some(fx.root.join(".cache")),
            detailed: true,
            ..ScanOptions::default()
        };
        let first = scan_project(&fx.root, &options).unwrap();
        assert!(fx.root.join(".cache").read_dir().unwrap().next().is_some());
        let second = scan_project(&fx.root, &options).unwrap();
        assert_eq!(first.summary, second.summary);
        assert_eq!(first.files, second.files);
    }

    #[test]
    fn test_scan_errors() {
        let missing = std::env::temp_dir().join("tachui_scan_does_not_exist");
        assert!(matches!(
            scan_project(&missing, &ScanOptions::default()),
            Err(ReportError::Read { .. })
        ));

        let fx = Fixture::new("errors");
        let options = ScanOptions {
            pattern: "**/*.{ts".to_string(),
            ..ScanOptions::default()
        };
        assert!(matches!(
            scan_project(&fx.root, &options),
            Err(ReportError::Pattern { .. })
        ));
    }
}
