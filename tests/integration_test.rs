use std::cell::{Cell, RefCell};
use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use zip::write::FileOptions;

use cpscan::error::LoadFailure;
use cpscan::listener::ScanListener;
use cpscan::matcher::text;
use cpscan::matchers::{ClassMatcher, ResourceMatcher};
use cpscan::reflect::{MapTypeLoader, ReflectedClass, TypeLoader};
use cpscan::resource::Resource;
use cpscan::root::{CancelToken, ContentKind, Root, RootCategory};
use cpscan::roots::RootsBuilder;
use cpscan::scanner::FilterSet;
use cpscan::ScanError;

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Create a compiled-output directory tree for testing.
///
/// Structure:
/// ```text
/// tmp/
///   org/demo/Alpha.class
///   org/demo/Beta.class
///   org/demo/sub/Gamma.class
///   org/demo/notes.txt
///   .git/config            (skipped by traversal)
/// ```
fn compiled_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path();

    fs::create_dir_all(base.join("org/demo/sub")).unwrap();
    fs::write(base.join("org/demo/Alpha.class"), b"a").unwrap();
    fs::write(base.join("org/demo/Beta.class"), b"b").unwrap();
    fs::write(base.join("org/demo/sub/Gamma.class"), b"g").unwrap();
    fs::write(base.join("org/demo/notes.txt"), b"n").unwrap();

    fs::create_dir(base.join(".git")).unwrap();
    fs::write(base.join(".git/config"), b"x").unwrap();

    dir
}

fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut jar = zip::ZipWriter::new(file);
    for (name, content) in entries {
        jar.start_file(*name, FileOptions::default()).unwrap();
        jar.write_all(content).unwrap();
    }
    jar.finish().unwrap();
}

fn dir_root(path: &Path) -> Root {
    Root::directory(path, RootCategory::Main, ContentKind::Binary).unwrap()
}

fn demo_loader() -> MapTypeLoader {
    MapTypeLoader::new()
        .class(ReflectedClass::named("org.demo.Alpha").supertype("org.demo.Base"))
        .class(ReflectedClass::named("org.demo.Beta"))
        .class(ReflectedClass::named("org.demo.sub.Gamma"))
        .class(ReflectedClass::named("lib.Dep"))
}

/// Counts class-load failures and lets the run continue, so partial failure
/// is observable without aborting.
#[derive(Default)]
struct ErrorTally {
    failed_names: RefCell<Vec<String>>,
}

impl ScanListener for ErrorTally {
    fn on_class_error(
        &self,
        _resource: &Resource,
        class_name: &str,
        _error: ScanError,
    ) -> Result<(), ScanError> {
        self.failed_names.borrow_mut().push(class_name.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn discovers_classes_across_directory_and_archive_roots() {
    let dir = compiled_tree();
    let jar_dir = tempfile::tempdir().unwrap();
    let jar = jar_dir.path().join("dep.jar");
    write_jar(&jar, &[("lib/Dep.class", b""), ("META-INF/MANIFEST.MF", b"")]);

    let scanner = cpscan::scan()
        .root(dir_root(dir.path()))
        .root(Root::archive(&jar, RootCategory::Dependency, ContentKind::Binary).unwrap())
        .type_loader(demo_loader())
        .build()
        .unwrap();

    let names = scanner.find_class_names().unwrap().to_vec();
    assert_eq!(
        names,
        vec!["org.demo.Alpha", "org.demo.Beta", "org.demo.sub.Gamma", "lib.Dep"],
        "directory resources in traversal order, then archive entries"
    );

    let classes = scanner.find_classes().unwrap().to_vec();
    assert_eq!(classes.len(), 4);
}

#[test]
fn traversal_matches_an_independent_walk() {
    let dir = compiled_tree();
    let scanner = cpscan::scan().root(dir_root(dir.path())).build().unwrap();

    let seen = scanner.find_resources().unwrap().to_vec().len();

    let expected = walkdir::WalkDir::new(dir.path())
        .into_iter()
        .filter_entry(|e| e.file_name().to_string_lossy() != ".git")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count();

    assert_eq!(seen, expected, "every regular file outside VCS dirs visited");
}

#[test]
fn exclude_takes_precedence_over_include_end_to_end() {
    let dir = compiled_tree();
    let filter = FilterSet::with()
        .include_resource(ResourceMatcher::with().path_glob("**/demo/**").unwrap())
        .exclude_resource(ResourceMatcher::with().path_ending_with("Beta.class"))
        .build();

    let scanner = cpscan::scan()
        .root(dir_root(dir.path()))
        .filter(filter)
        .type_loader(demo_loader())
        .build()
        .unwrap();

    let names = scanner.find_class_names().unwrap().to_vec();
    assert!(names.contains(&"org.demo.Alpha".to_string()));
    assert!(
        !names.contains(&"org.demo.Beta".to_string()),
        "Beta matches the include glob too, but the exclude must win"
    );
}

#[test]
fn class_level_filtering_selects_by_reflected_shape() {
    let dir = compiled_tree();
    let filter = FilterSet::with()
        .include_class(ClassMatcher::that().subclass_of("org.demo.Base"))
        .build();

    let scanner = cpscan::scan()
        .root(dir_root(dir.path()))
        .filter(filter)
        .type_loader(demo_loader())
        .build()
        .unwrap();

    let classes = scanner.find_classes().unwrap().to_vec();
    assert_eq!(classes.len(), 1);
    assert_eq!(classes[0].name(), "org.demo.Alpha");
}

#[test]
fn one_unloadable_name_does_not_abort_the_run() {
    let dir = compiled_tree();
    let partial = MapTypeLoader::new()
        .class(ReflectedClass::named("org.demo.Alpha"))
        .class(ReflectedClass::named("org.demo.sub.Gamma"))
        .failing("org.demo.Beta", LoadFailure::NotFound);

    let tally = Rc::new(ErrorTally::default());
    let scanner = cpscan::scan()
        .root(dir_root(dir.path()))
        .listener(Rc::clone(&tally))
        .type_loader(partial)
        .build()
        .unwrap();

    let classes = scanner.find_classes().unwrap().to_vec();
    let names: Vec<&str> = classes.iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["org.demo.Alpha", "org.demo.sub.Gamma"]);
    assert_eq!(
        *tally.failed_names.borrow(),
        vec!["org.demo.Beta".to_string()],
        "error callback invoked exactly once, for the failing name"
    );
}

#[test]
fn consuming_an_early_stage_never_loads_classes() {
    struct ExplodingLoader;

    impl TypeLoader for ExplodingLoader {
        fn load(&self, name: &str) -> Result<Arc<ReflectedClass>, ScanError> {
            panic!("stage-one consumption must not load '{name}'");
        }
    }

    let dir = compiled_tree();
    let scanner = cpscan::scan()
        .root(dir_root(dir.path()))
        .type_loader(ExplodingLoader)
        .build()
        .unwrap();

    assert_eq!(scanner.find_resources().unwrap().to_vec().len(), 4);
    assert_eq!(scanner.find_class_names().unwrap().to_vec().len(), 3);
}

#[test]
fn cancellation_cuts_the_scan_short() {
    #[derive(Default)]
    struct CancelAfter {
        seen: Cell<usize>,
        token: CancelToken,
    }

    impl ScanListener for CancelAfter {
        fn on_resource_matched(&self, _resource: &Resource) {
            self.seen.set(self.seen.get() + 1);
            if self.seen.get() == 2 {
                self.token.cancel();
            }
        }
    }

    let dir = compiled_tree();
    let hook = Rc::new(CancelAfter::default());
    let scanner = cpscan::scan()
        .root(dir_root(dir.path()))
        .cancel_token(hook.token.clone())
        .listener(Rc::clone(&hook))
        .build()
        .unwrap();

    let resources = scanner.find_resources().unwrap().to_vec();
    assert_eq!(resources.len(), 2, "nothing beyond the cancellation point");
}

#[test]
fn duplicate_logical_roots_scan_once() {
    let dir = compiled_tree();
    let roots = RootsBuilder::new()
        .root(Root::directory(dir.path(), RootCategory::Unknown, ContentKind::Binary).unwrap())
        .root(dir_root(dir.path()))
        .build()
        .unwrap();

    let scanner = cpscan::scan()
        .roots(roots)
        .type_loader(demo_loader())
        .build()
        .unwrap();

    let names = scanner.find_class_names().unwrap().to_vec();
    assert_eq!(names.len(), 3, "the same location must not be scanned twice");
}

#[test]
fn discovered_resources_read_back_through_their_root() {
    let jar_dir = tempfile::tempdir().unwrap();
    let jar = jar_dir.path().join("content.jar");
    write_jar(&jar, &[("msg/hello.txt", b"hi there")]);

    let scanner = cpscan::scan()
        .root(Root::archive(&jar, RootCategory::Dependency, ContentKind::Binary).unwrap())
        .build()
        .unwrap();

    let resources = scanner.find_resources().unwrap();
    let hello = resources
        .filter(ResourceMatcher::with().extension("txt"))
        .first()
        .unwrap();
    assert_eq!(hello.rel_path(), "/msg/hello.txt");
    assert_eq!(hello.read_string().unwrap(), "hi there");
}

#[test]
fn result_views_compose_over_scan_output() {
    let dir = compiled_tree();
    let scanner = cpscan::scan()
        .root(dir_root(dir.path()))
        .type_loader(demo_loader())
        .build()
        .unwrap();

    let by_simple_name = scanner
        .find_classes()
        .unwrap()
        .transform(|c| Some(c.simple_name().to_string()))
        .filter(text::starting_with("G"))
        .to_map(|n| n.len());

    assert_eq!(by_simple_name.len(), 1);
    assert_eq!(by_simple_name[&5], "Gamma");
}
