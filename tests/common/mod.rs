#![allow(dead_code)]

//! In-memory synthesis of minimal class files for end-to-end tests. Only the
//! structures the analyzer reads are emitted: constant pool, class links,
//! method declarations, and Code attributes holding invoke instructions.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const MAIN_DESC: &str = "([Ljava/lang/String;)V";

const ACC_PUBLIC: u16 = 0x0001;
const ACC_PRIVATE: u16 = 0x0002;
const ACC_STATIC: u16 = 0x0008;
const ACC_SUPER: u16 = 0x0020;
const ACC_INTERFACE: u16 = 0x0200;
const ACC_ABSTRACT: u16 = 0x0400;
const ACC_SYNTHETIC: u16 = 0x1000;

const INVOKEVIRTUAL: u8 = 0xb6;
const INVOKESPECIAL: u8 = 0xb7;
const INVOKESTATIC: u8 = 0xb8;
const INVOKEINTERFACE: u8 = 0xb9;
const RETURN: u8 = 0xb1;

pub fn class(fqn: &str) -> ClassBuilder {
    ClassBuilder {
        fqn: fqn.to_string(),
        super_fqn: Some("java.lang.Object".to_string()),
        interfaces: Vec::new(),
        flags: ACC_PUBLIC | ACC_SUPER,
        methods: Vec::new(),
    }
}

pub struct ClassBuilder {
    fqn: String,
    super_fqn: Option<String>,
    interfaces: Vec<String>,
    flags: u16,
    methods: Vec<MethodDef>,
}

impl ClassBuilder {
    pub fn interface(mut self) -> Self {
        self.flags = ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT;
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.flags |= ACC_ABSTRACT;
        self
    }

    pub fn extends(mut self, fqn: &str) -> Self {
        self.super_fqn = Some(fqn.to_string());
        self
    }

    /// Declare a superclass slot of zero, as java.lang.Object itself does.
    pub fn no_super(mut self) -> Self {
        self.super_fqn = None;
        self
    }

    pub fn implements(mut self, fqn: &str) -> Self {
        self.interfaces.push(fqn.to_string());
        self
    }

    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut pool = ConstantPool::new();
        let this_index = pool.class_entry(&self.fqn);
        let super_index = self
            .super_fqn
            .as_deref()
            .map(|fqn| pool.class_entry(fqn))
            .unwrap_or(0);
        let interface_indexes: Vec<u16> = self
            .interfaces
            .iter()
            .map(|fqn| pool.class_entry(fqn))
            .collect();

        let mut method_bytes = Vec::new();
        for method in &self.methods {
            let name_index = pool.utf8(&method.name);
            let descriptor_index = pool.utf8(&method.descriptor);
            method_bytes.extend(method.flags.to_be_bytes());
            method_bytes.extend(name_index.to_be_bytes());
            method_bytes.extend(descriptor_index.to_be_bytes());
            if method.flags & ACC_ABSTRACT != 0 {
                method_bytes.extend(0u16.to_be_bytes());
                continue;
            }
            let code = assemble_code(&mut pool, &method.calls);
            let attribute_name = pool.utf8("Code");
            method_bytes.extend(1u16.to_be_bytes());
            method_bytes.extend(attribute_name.to_be_bytes());
            // max_stack, max_locals, code_length, code, empty tables.
            let attribute_length = 2 + 2 + 4 + code.len() as u32 + 2 + 2;
            method_bytes.extend(attribute_length.to_be_bytes());
            method_bytes.extend(8u16.to_be_bytes());
            method_bytes.extend(8u16.to_be_bytes());
            method_bytes.extend((code.len() as u32).to_be_bytes());
            method_bytes.extend(&code);
            method_bytes.extend(0u16.to_be_bytes());
            method_bytes.extend(0u16.to_be_bytes());
        }

        let mut bytes = Vec::new();
        bytes.extend(0xCAFEBABEu32.to_be_bytes());
        bytes.extend(0u16.to_be_bytes());
        bytes.extend(52u16.to_be_bytes());
        bytes.extend(pool.count().to_be_bytes());
        bytes.extend(&pool.bytes);
        bytes.extend(self.flags.to_be_bytes());
        bytes.extend(this_index.to_be_bytes());
        bytes.extend(super_index.to_be_bytes());
        bytes.extend((interface_indexes.len() as u16).to_be_bytes());
        for index in interface_indexes {
            bytes.extend(index.to_be_bytes());
        }
        bytes.extend(0u16.to_be_bytes());
        bytes.extend((self.methods.len() as u16).to_be_bytes());
        bytes.extend(&method_bytes);
        bytes.extend(0u16.to_be_bytes());
        bytes
    }
}

pub fn method(name: &str, descriptor: &str) -> MethodDef {
    MethodDef {
        name: name.to_string(),
        descriptor: descriptor.to_string(),
        flags: ACC_PUBLIC,
        calls: Vec::new(),
    }
}

pub fn static_method(name: &str, descriptor: &str) -> MethodDef {
    MethodDef {
        flags: ACC_PUBLIC | ACC_STATIC,
        ..method(name, descriptor)
    }
}

pub fn main_method() -> MethodDef {
    static_method("main", MAIN_DESC)
}

pub fn abstract_method(name: &str, descriptor: &str) -> MethodDef {
    MethodDef {
        flags: ACC_PUBLIC | ACC_ABSTRACT,
        ..method(name, descriptor)
    }
}

pub fn constructor() -> MethodDef {
    method("<init>", "()V")
}

pub struct MethodDef {
    name: String,
    descriptor: String,
    flags: u16,
    calls: Vec<Call>,
}

impl MethodDef {
    pub fn private(mut self) -> Self {
        self.flags = (self.flags & !ACC_PUBLIC) | ACC_PRIVATE;
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.flags |= ACC_SYNTHETIC;
        self
    }

    pub fn invoke_virtual(self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.call(INVOKEVIRTUAL, owner, name, descriptor)
    }

    pub fn invoke_special(self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.call(INVOKESPECIAL, owner, name, descriptor)
    }

    pub fn invoke_static(self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.call(INVOKESTATIC, owner, name, descriptor)
    }

    pub fn invoke_interface(self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.call(INVOKEINTERFACE, owner, name, descriptor)
    }

    fn call(mut self, opcode: u8, owner: &str, name: &str, descriptor: &str) -> Self {
        self.calls.push(Call {
            opcode,
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        });
        self
    }
}

struct Call {
    opcode: u8,
    owner: String,
    name: String,
    descriptor: String,
}

fn assemble_code(pool: &mut ConstantPool, calls: &[Call]) -> Vec<u8> {
    let mut code = Vec::new();
    for call in calls {
        let index = pool.method_ref(
            &call.owner,
            &call.name,
            &call.descriptor,
            call.opcode == INVOKEINTERFACE,
        );
        code.push(call.opcode);
        code.extend(index.to_be_bytes());
        if call.opcode == INVOKEINTERFACE {
            code.push(1);
            code.push(0);
        }
    }
    code.push(RETURN);
    code
}

/// Growing constant pool with entry deduplication. Indexes are 1-based; the
/// emitted count field is entries + 1 per the class file format.
struct ConstantPool {
    bytes: Vec<u8>,
    next_index: u16,
    utf8_entries: HashMap<String, u16>,
    class_entries: HashMap<String, u16>,
    name_and_type_entries: HashMap<(u16, u16), u16>,
    method_ref_entries: HashMap<(u16, u16, bool), u16>,
}

impl ConstantPool {
    fn new() -> Self {
        Self {
            bytes: Vec::new(),
            next_index: 1,
            utf8_entries: HashMap::new(),
            class_entries: HashMap::new(),
            name_and_type_entries: HashMap::new(),
            method_ref_entries: HashMap::new(),
        }
    }

    fn count(&self) -> u16 {
        self.next_index
    }

    fn allocate(&mut self) -> u16 {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    fn utf8(&mut self, value: &str) -> u16 {
        if let Some(&index) = self.utf8_entries.get(value) {
            return index;
        }
        let index = self.allocate();
        self.bytes.push(1);
        self.bytes.extend((value.len() as u16).to_be_bytes());
        self.bytes.extend(value.as_bytes());
        self.utf8_entries.insert(value.to_string(), index);
        index
    }

    fn class_entry(&mut self, fqn: &str) -> u16 {
        let internal = fqn.replace('.', "/");
        if let Some(&index) = self.class_entries.get(&internal) {
            return index;
        }
        let name_index = self.utf8(&internal);
        let index = self.allocate();
        self.bytes.push(7);
        self.bytes.extend(name_index.to_be_bytes());
        self.class_entries.insert(internal, index);
        index
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        if let Some(&index) = self.name_and_type_entries.get(&(name_index, descriptor_index)) {
            return index;
        }
        let index = self.allocate();
        self.bytes.push(12);
        self.bytes.extend(name_index.to_be_bytes());
        self.bytes.extend(descriptor_index.to_be_bytes());
        self.name_and_type_entries
            .insert((name_index, descriptor_index), index);
        index
    }

    fn method_ref(&mut self, owner: &str, name: &str, descriptor: &str, interface: bool) -> u16 {
        let class_index = self.class_entry(owner);
        let name_and_type_index = self.name_and_type(name, descriptor);
        let key = (class_index, name_and_type_index, interface);
        if let Some(&index) = self.method_ref_entries.get(&key) {
            return index;
        }
        let index = self.allocate();
        self.bytes.push(if interface { 11 } else { 10 });
        self.bytes.extend(class_index.to_be_bytes());
        self.bytes.extend(name_and_type_index.to_be_bytes());
        self.method_ref_entries.insert(key, index);
        index
    }
}

/// Write classes as loose files laid out by package, the way javac does.
pub fn write_class_dir(dir: &Path, classes: &[(&str, Vec<u8>)]) {
    for (fqn, bytes) in classes {
        let relative = format!("{}.class", fqn.replace('.', "/"));
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().expect("class file parent")).expect("create package dir");
        fs::write(path, bytes).expect("write class file");
    }
}

/// Write classes into a JAR at `path`.
pub fn write_jar(path: &Path, classes: &[(&str, Vec<u8>)]) {
    write_archive(path, classes, "");
}

/// Write classes into a WAR at `path`, under the servlet class directory.
pub fn write_war(path: &Path, classes: &[(&str, Vec<u8>)]) {
    write_archive(path, classes, "WEB-INF/classes/");
}

fn write_archive(path: &Path, classes: &[(&str, Vec<u8>)], prefix: &str) {
    let file = fs::File::create(path).expect("create archive");
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (fqn, bytes) in classes {
        let entry = format!("{}{}.class", prefix, fqn.replace('.', "/"));
        writer.start_file(entry, options).expect("start archive entry");
        writer.write_all(bytes).expect("write archive entry");
    }
    writer.finish().expect("finish archive");
}
