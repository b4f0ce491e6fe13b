//! PDF 页面复制与累加文档

use std::collections::HashMap;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};

use crate::error::MergeError;

/// 可以从父节点继承、复制到新文档时需要落到页面上的属性
const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// 页面树最大深度，防止损坏的 Parent 链造成死循环
const MAX_TREE_DEPTH: usize = 32;

/// 在两个文档之间复制对象，记录旧 ID 到新 ID 的映射
struct ObjectCopier<'a> {
    source: &'a Document,
    target: &'a mut Document,
    id_map: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    fn new(source: &'a Document, target: &'a mut Document) -> Self {
        Self {
            source,
            target,
            id_map: HashMap::new(),
        }
    }

    /// 源文档的页面树节点直接映射到目标文档的 Pages，
    /// 这样页面的 Parent 会自动指向新的页面树，旧的树不会被复制过来
    fn adopt_page_tree(&mut self, source_node: ObjectId, target_pages: ObjectId) {
        self.id_map.insert(source_node, target_pages);
    }

    /// 递归复制对象及其引用的所有对象
    fn copy_object(&mut self, source_id: ObjectId) -> Result<ObjectId, lopdf::Error> {
        if let Some(target_id) = self.id_map.get(&source_id) {
            return Ok(*target_id);
        }

        // 先占位再递归，打断 Page -> Annot -> Page 这类循环引用
        let new_id = self.target.add_object(Object::Null);
        self.id_map.insert(source_id, new_id);

        let obj = self.source.get_object(source_id)?.clone();
        let new_obj = self.remap_references(obj)?;
        self.replace(new_id, new_obj)?;

        Ok(new_id)
    }

    /// 为页面预留目标 ID
    ///
    /// 页面之间可能互相引用（链接注释的 Dest），必须在复制任何对象之前预留，
    /// 否则后面的页面会先被当作普通对象复制一份
    fn reserve_page(&mut self, page_id: ObjectId) -> ObjectId {
        let new_id = self.target.add_object(Object::Null);
        self.id_map.insert(page_id, new_id);
        new_id
    }

    /// 复制页面到预留的位置，补齐从父节点继承的属性
    fn copy_page(&mut self, page_id: ObjectId) -> Result<ObjectId, lopdf::Error> {
        let new_id = match self.id_map.get(&page_id) {
            Some(reserved) => *reserved,
            None => self.reserve_page(page_id),
        };

        let mut page = self.source.get_dictionary(page_id)?.clone();
        for key in INHERITABLE_KEYS {
            if !page.has(key) {
                if let Some(value) = inherited_attribute(self.source, &page, key) {
                    page.set(key.to_vec(), value);
                }
            }
        }

        let new_obj = self.remap_references(Object::Dictionary(page))?;
        self.replace(new_id, new_obj)?;

        Ok(new_id)
    }

    fn replace(&mut self, id: ObjectId, obj: Object) -> Result<(), lopdf::Error> {
        match self.target.objects.get_mut(&id) {
            Some(slot) => {
                *slot = obj;
                Ok(())
            }
            None => Err(lopdf::Error::ObjectNotFound(id)),
        }
    }

    fn remap_references(&mut self, obj: Object) -> Result<Object, lopdf::Error> {
        match obj {
            Object::Reference(id) => Ok(Object::Reference(self.copy_object(id)?)),
            Object::Array(arr) => {
                let new_arr = arr
                    .into_iter()
                    .map(|o| self.remap_references(o))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Object::Array(new_arr))
            }
            Object::Dictionary(mut dict) => {
                self.remap_dictionary(&mut dict)?;
                Ok(Object::Dictionary(dict))
            }
            Object::Stream(mut stream) => {
                self.remap_dictionary(&mut stream.dict)?;
                Ok(Object::Stream(stream))
            }
            _ => Ok(obj),
        }
    }

    fn remap_dictionary(&mut self, dict: &mut Dictionary) -> Result<(), lopdf::Error> {
        for (_, value) in dict.iter_mut() {
            *value = self.remap_references(value.clone())?;
        }
        Ok(())
    }
}

/// 沿 Parent 链查找可继承属性，引用会被解引用成值
fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

/// 页面的所有祖先节点（页面树中的 Pages 节点）
fn page_tree_ancestors(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    let mut ancestors = Vec::new();
    let mut current = doc.get_dictionary(page_id).ok();
    for _ in 0..MAX_TREE_DEPTH {
        let Some(parent) = current
            .and_then(|dict| dict.get(b"Parent").ok())
            .and_then(|obj| obj.as_reference().ok())
        else {
            break;
        };
        ancestors.push(parent);
        current = doc.get_dictionary(parent).ok();
    }
    ancestors
}

/// 合并用的累加文档
///
/// 新建时是一个没有页面的合法 PDF，每次 `append` 把源文档的所有页面按顺序追加到末尾
pub struct Accumulator {
    doc: Document,
    pages_id: ObjectId,
    page_count: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Self {
            doc,
            pages_id,
            page_count: 0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// 追加源文档的全部页面，返回追加的页数
    pub fn append(&mut self, source: &Document) -> Result<usize, MergeError> {
        let source_pages = source.get_pages();
        if source_pages.is_empty() {
            return Ok(0);
        }

        let mut copier = ObjectCopier::new(source, &mut self.doc);
        let mut new_kids = Vec::with_capacity(source_pages.len());

        // get_pages 是按页码排序的 BTreeMap
        for page_id in source_pages.values() {
            for ancestor in page_tree_ancestors(source, *page_id) {
                copier.adopt_page_tree(ancestor, self.pages_id);
            }
            new_kids.push(Object::Reference(copier.reserve_page(*page_id)));
        }
        for page_id in source_pages.values() {
            copier.copy_page(*page_id)?;
        }

        let appended = new_kids.len();
        let pages = self.doc.get_object_mut(self.pages_id)?.as_dict_mut()?;
        let mut kids = pages.get(b"Kids")?.as_array()?.clone();
        kids.extend(new_kids);
        pages.set("Kids", Object::Array(kids));
        self.page_count += appended;
        pages.set("Count", self.page_count as i64);

        Ok(appended)
    }

    /// 序列化为 PDF 字节
    pub fn into_bytes(mut self) -> Result<Vec<u8>, MergeError> {
        let info_id = self.doc.add_object(dictionary! {
            "Producer" => Object::string_literal(concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))),
        });
        self.doc.trailer.set("Info", info_id);
        self.doc.compress();

        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .map_err(|e| MergeError::Encode(e.to_string()))?;
        Ok(bytes)
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}
